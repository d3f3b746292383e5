use super::*;

fn config() -> ServerConfig {
    ServerConfig {
        database_url: "postgres://x".into(),
        port: 3000,
        db_max_connections: 5,
        session_ttl_days: 7,
        cookie_secure: true,
    }
}

#[tokio::test]
async fn new_copies_session_settings() {
    let pool = test_helpers::test_app_state().pool;
    let state = AppState::new(pool, &config());
    assert_eq!(state.session_ttl_days, 7);
    assert!(state.cookie_secure);
}

#[tokio::test]
async fn test_state_uses_defaults() {
    let state = test_helpers::test_app_state();
    assert_eq!(state.session_ttl_days, DEFAULT_SESSION_TTL_DAYS);
    assert!(!state.cookie_secure);
}

#[tokio::test]
async fn state_clones_share_settings() {
    let state = test_helpers::test_app_state();
    let cloned = state.clone();
    assert_eq!(cloned.session_ttl_days, state.session_ttl_days);
    assert_eq!(cloned.cookie_secure, state.cookie_secure);
}
