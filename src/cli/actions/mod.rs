pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        secret: SecretString,
        db_host: String,
        db_port: u16,
        db_user: String,
        db_password: SecretString,
        db_name: String,
    },
}
