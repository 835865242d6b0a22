use futures::Stream;

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Error(String),
    Closed,
}

/// Opens physical connections for a channel.
///
/// A connection is a stream of [`TransportEvent`]s; the stream ending counts as
/// [`TransportEvent::Closed`]. Dropping the connection must release the underlying
/// transport.
pub trait Connector {
    type Connection: Stream<Item = TransportEvent> + Unpin;

    fn connect(&mut self, target_id: &str) -> Result<Self::Connection, TransportError>;
}

impl<F, S> Connector for F
where
    F: FnMut(&str) -> Result<S, TransportError>,
    S: Stream<Item = TransportEvent> + Unpin,
{
    type Connection = S;

    fn connect(&mut self, target_id: &str) -> Result<S, TransportError> {
        self(target_id)
    }
}
