use std::net::SocketAddrV4;

/// Server configs
#[derive(Debug)]
pub(crate) struct ServerConfig {
    pub addr: SocketAddrV4,
    pub db_read_conn_str: String,
    pub db_write_conn_str: String,
    /// shared staff secret, presented as a bearer token by every client
    pub auth_token: String,
}

impl ServerConfig {
    pub fn new(
        addr: SocketAddrV4,
        db_read_conn_str: String,
        db_write_conn_str: String,
        auth_token: String,
    ) -> Self {
        Self {
            addr,
            db_read_conn_str,
            db_write_conn_str,
            auth_token,
        }
    }
}
