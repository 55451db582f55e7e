//! Runs the read loop for a single WebSocket connection: decodes each
//! binary frame and dispatches it into the shared client core. A normal
//! close is silent; any other error tears down the connection.

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::operation::callbacks::Callbacks;

use super::client::OpAMPWsClient;
use super::framing::decode_frame;

pub(crate) async fn run<C, S>(
    mut stream: S,
    client: std::sync::Arc<OpAMPWsClient<C>>,
    cancel: CancellationToken,
) where
    C: Callbacks + Send + Sync + 'static,
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("websocket receiver stopping");
                return;
            }
            next = stream.next() => {
                match next {
                    Some(Ok(Message::Binary(bytes))) => {
                        match decode_frame(&bytes) {
                            Ok(msg) => {
                                if let Err(e) = client.handle_frame(msg).await {
                                    error!("failed to process server message: {e}");
                                }
                            }
                            Err(e) => error!("failed to decode server frame: {e}"),
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!("server closed the websocket connection");
                        cancel.cancel();
                        return;
                    }
                    // OpAMP frames are always binary; pings are answered by
                    // tungstenite automatically, text/pong frames are ignored.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("websocket read error: {e}");
                        cancel.cancel();
                        return;
                    }
                    None => {
                        debug!("websocket connection closed");
                        cancel.cancel();
                        return;
                    }
                }
            }
        }
    }
}
