pub const SELECT_ACTIVE_ALERT_FOR_UPDATE: &str = r#"
SELECT id, user_id, latitude, longitude, status, created_at, updated_at
FROM emergency_alerts
WHERE user_id = $1 AND status = 'active'
ORDER BY created_at DESC
LIMIT 1
FOR UPDATE;
"#;

pub const SELECT_ACTIVE_ALERT: &str = r#"
SELECT id, user_id, latitude, longitude, status, created_at, updated_at
FROM emergency_alerts
WHERE user_id = $1 AND status = 'active'
ORDER BY created_at DESC
LIMIT 1;
"#;

pub const SELECT_ALERT_BY_ID: &str = r#"
SELECT id, user_id, latitude, longitude, status, created_at, updated_at
FROM emergency_alerts
WHERE id = $1;
"#;

pub const INSERT_ALERT: &str = r#"
INSERT INTO emergency_alerts (id, user_id, latitude, longitude, status, created_at, updated_at)
VALUES ($1, $2, $3, $4, 'active', NOW(), NOW());
"#;

pub const UPDATE_ALERT_LOCATION: &str = r#"
UPDATE emergency_alerts
SET latitude = $2,
    longitude = $3,
    updated_at = NOW()
WHERE id = $1 AND status = 'active';
"#;

pub const RESOLVE_ACTIVE_ALERTS: &str = r#"
UPDATE emergency_alerts
SET status = 'resolved',
    updated_at = NOW()
WHERE user_id = $1 AND status = 'active';
"#;
