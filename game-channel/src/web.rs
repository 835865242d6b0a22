use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::Stream;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CloseEvent, ErrorEvent, Event, MessageEvent, WebSocket};

use cah_lib::urls::gamestate_websocket_url;

use crate::error::TransportError;
use crate::transport::{Connector, TransportEvent};

fn js_error(value: JsValue) -> TransportError {
    TransportError::Connect(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

/// Opens the game state websocket on the host serving the current page.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    fn connect(&mut self, target_id: &str) -> Result<Self::Connection, TransportError> {
        let window = web_sys::window()
            .ok_or_else(|| TransportError::Unavailable("no window".to_string()))?;
        let location = window.location();
        let protocol = location.protocol().map_err(js_error)?;
        let host = location.host().map_err(js_error)?;
        WebSocketConnection::open(&gamestate_websocket_url(&protocol, &host, target_id))
    }
}

pub struct WebSocketConnection {
    socket: WebSocket,
    events: UnboundedReceiver<TransportEvent>,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl WebSocketConnection {
    pub fn open(url: &str) -> Result<Self, TransportError> {
        log::debug!("Opening websocket {url}");
        let socket = WebSocket::new(url).map_err(js_error)?;
        let (tx, events) = mpsc::unbounded();

        let on_open = {
            let tx = tx.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                let _ = tx.unbounded_send(TransportEvent::Opened);
            })
        };
        let on_message = {
            let tx = tx.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |e: MessageEvent| {
                match e.data().as_string() {
                    Some(text) => {
                        let _ = tx.unbounded_send(TransportEvent::Message(text));
                    }
                    None => log::warn!("Ignoring non-text websocket message"),
                }
            })
        };
        let on_error = {
            let tx = tx.clone();
            Closure::<dyn FnMut(Event)>::new(move |e: Event| {
                let message = e
                    .dyn_ref::<ErrorEvent>()
                    .map(|e| e.message())
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "websocket error".to_string());
                let _ = tx.unbounded_send(TransportEvent::Error(message));
            })
        };
        let on_close = Closure::<dyn FnMut(CloseEvent)>::new(move |e: CloseEvent| {
            log::debug!("Websocket closed ({}) {}", e.code(), e.reason());
            let _ = tx.unbounded_send(TransportEvent::Closed);
        });

        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Ok(WebSocketConnection {
            socket,
            events,
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
            _on_close: on_close,
        })
    }
}

impl Stream for WebSocketConnection {
    type Item = TransportEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onerror(None);
        self.socket.set_onclose(None);
        if let Err(e) = self.socket.close() {
            log::debug!("Websocket close failed: {e:?}");
        }
    }
}
