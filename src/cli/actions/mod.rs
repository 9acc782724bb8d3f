pub mod server;

/// Action dispatched from the command line.
#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}
