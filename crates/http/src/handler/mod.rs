//! The application boundary.
//!
//! A [`Handler`] is invoked exactly once per accepted connection with the two sides of
//! the exchange. It drives [`Input::wait_event`] and the `read_*` calls to consume the
//! request, and the `write_*` calls of [`Output`] to produce the response. Whatever the
//! handler leaves behind, the server flushes the output and closes the connection after
//! it returns.
//!
//! The handler value itself carries any application context.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::connection::{InputMessage, OutputMessage};

/// The input side of an exchange over a TCP connection
pub type Input = InputMessage<OwnedReadHalf>;

/// The output side of an exchange over a TCP connection
pub type Output = OutputMessage<OwnedWriteHalf>;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, input: &mut Input, output: &mut Output);
}

/// A [`Handler`] backed by a function, see [`make_handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Input, &'a mut Output) -> BoxFuture<'a, ()> + Send + Sync,
{
    async fn call(&self, input: &mut Input, output: &mut Output) {
        (self.f)(input, output).await
    }
}

/// Wraps a function returning a boxed future into a [`Handler`].
///
/// ```no_run
/// use futures::FutureExt;
/// use webster::handler::make_handler;
///
/// let handler = make_handler(|_input, output| {
///     async move {
///         let _ = output.write_string("hello").await;
///     }
///     .boxed()
/// });
/// ```
pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Input, &'a mut Output) -> BoxFuture<'a, ()> + Send + Sync,
{
    HandlerFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Event;
    use futures::FutureExt;
    use http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        (client.unwrap(), accepted.unwrap().0)
    }

    #[tokio::test]
    async fn closure_handler_drives_both_sides() {
        let (mut client, server_side) = connected_pair().await;
        let (reader, writer) = server_side.into_split();
        let mut input = InputMessage::new(reader);
        let mut output = OutputMessage::new(writer);

        let handler = make_handler(|input, output| {
            async move {
                let event = input.wait_event().await.unwrap();
                assert!(event.is_header());
                let method = input.header().unwrap().method().clone();

                output.set_status(StatusCode::ACCEPTED).unwrap();
                output.write_header_field("X-Method", method.as_str()).await.unwrap();
                assert_eq!(input.wait_event().await.unwrap(), Event::Complete);
            }
            .boxed()
        });

        client.write_all(b"DELETE /item HTTP/1.1\r\n\r\n").await.unwrap();
        handler.call(&mut input, &mut output).await;
        output.flush().await.unwrap();
        output.shutdown().await.unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        assert_eq!(response, "HTTP/1.1 202 Accepted\r\nX-Method: DELETE\r\n\r\n");
    }
}
