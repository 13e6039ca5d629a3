use tokio_postgres::Client;

use crate::server::database::pool::Pool;

#[derive(Clone)]
pub(crate) struct AppState {
    db_read_pool: Pool<Client>,
    db_write_pool: Pool<Client>,
    auth_token: String,
}

impl AppState {
    pub fn new(db_read_pool: Pool<Client>, db_write_pool: Pool<Client>, auth_token: String) -> Self {
        Self {
            db_read_pool,
            db_write_pool,
            auth_token,
        }
    }

    pub fn get_db_read_pool(&self) -> Pool<Client> {
        self.db_read_pool.clone()
    }

    pub fn get_db_write_pool(&self) -> Pool<Client> {
        self.db_write_pool.clone()
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn app_state() {
        let state = AppState::new(Pool::new("read"), Pool::new("write"), "sekrit".to_string());
        assert_eq!(state.auth_token(), "sekrit");
        // empty pools hand out nothing
        assert!(state.get_db_read_pool().acquire(0).await.is_none());
        assert!(state.get_db_write_pool().acquire(0).await.is_none());
    }
}
