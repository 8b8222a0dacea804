use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, UnboundedSender};

use rudis::commands::Command;
use rudis::config::Config;
use rudis::connection::Connection;
use rudis::frame::Frame;
use rudis::Error;

/// Stands up a scripted peer: whatever bytes are pushed into the channel are
/// written verbatim to the accepted socket. Dropping the sender closes the
/// socket.
async fn create_connection(read_timeout: Duration) -> (UnboundedSender<Vec<u8>>, Connection) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            while let Some(data) = rx.recv().await {
                // Write the received channel data to the socket.
                if socket.write_all(&data).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut connection = Connection::new(Config::new("127.0.0.1", port).read_timeout(read_timeout));
    connection.connect().await.unwrap();

    (tx, connection)
}

#[tokio::test]
async fn test_read_simple_string_reply() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    tx.send(b"+OK\r\n".to_vec()).unwrap();

    let actual = connection.read_reply().await.unwrap();
    assert_eq!(actual, Frame::Simple("OK".to_string()));
}

#[tokio::test]
async fn test_read_bulk_string_reply() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    tx.send(b"$5\r\nhello\r\n".to_vec()).unwrap();

    let actual = connection.read_reply().await.unwrap();
    assert_eq!(actual, Frame::Bulk(Bytes::from("hello")));
}

#[tokio::test]
async fn test_read_error_reply() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    tx.send(b"-Error message\r\n".to_vec()).unwrap();

    let actual = connection.read_reply().await.unwrap();
    assert_eq!(actual, Frame::Error("Error message".to_string()));
}

#[tokio::test]
async fn test_read_integer_reply() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    tx.send(b":1000\r\n".to_vec()).unwrap();

    let actual = connection.read_reply().await.unwrap();
    assert_eq!(actual, Frame::Integer(1000));
}

#[tokio::test]
async fn test_read_null_bulk_string_reply() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    tx.send(b"$-1\r\n".to_vec()).unwrap();

    let actual = connection.read_reply().await.unwrap();
    assert_eq!(actual, Frame::Null);
}

#[tokio::test]
async fn test_read_array_reply() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    tx.send(b"*2\r\n$5\r\nhello\r\n:42\r\n".to_vec()).unwrap();

    let actual = connection.read_reply().await.unwrap();
    assert_eq!(
        actual,
        Frame::Array(vec![Frame::Bulk(Bytes::from("hello")), Frame::Integer(42)])
    );
}

#[tokio::test]
async fn test_read_reply_split_across_packets() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    tx.send(b"$11\r\nhello".to_vec()).unwrap();
    tx.send(b" world\r\n".to_vec()).unwrap();

    let actual = connection.read_reply().await.unwrap();
    assert_eq!(actual, Frame::Bulk(Bytes::from("hello world")));
}

#[tokio::test]
async fn test_replies_arrive_in_submission_order() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    connection.send(Command::Incr, &[Bytes::from("n")]).await.unwrap();
    connection.send(Command::Incr, &[Bytes::from("n")]).await.unwrap();
    assert_eq!(connection.pending(), 2);

    tx.send(b":1\r\n:2\r\n".to_vec()).unwrap();

    let replies = connection.get_all(0).await.unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(*replies[0].as_ref().unwrap(), Frame::Integer(1));
    assert_eq!(*replies[1].as_ref().unwrap(), Frame::Integer(2));
    assert_eq!(connection.pending(), 0);
}

#[tokio::test]
async fn test_eof_marks_the_connection_broken() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    drop(tx);

    let err = connection.read_reply().await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert!(connection.is_broken());
}

#[tokio::test]
async fn test_broken_connection_fences_later_reads() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    drop(tx);
    let _ = connection.read_reply().await.unwrap_err();

    // No network activity happens here: the broken flag refuses up front.
    let err = connection.read_reply().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ref msg) if msg.contains("broken")
    ));
}

#[tokio::test]
async fn test_read_timeout_marks_the_connection_broken() {
    let (_tx, mut connection) = create_connection(Duration::from_millis(50)).await;

    // The peer stays silent; the effective deadline must fire.
    let err = connection.read_reply().await.unwrap_err();
    assert!(matches!(err, Error::Connection(ref msg) if msg.contains("timed out")));
    assert!(connection.is_broken());
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let (_tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    assert!(connection.is_connected());
    connection.connect().await.unwrap();
    assert!(connection.is_connected());
}

#[tokio::test]
async fn test_close_is_idempotent_and_reconnect_clears_broken() {
    let (tx, mut connection) = create_connection(Duration::from_secs(1)).await;

    drop(tx);
    let _ = connection.read_reply().await.unwrap_err();
    assert!(connection.is_broken());

    connection.close();
    connection.close();
    assert!(!connection.is_connected());
    // Still fenced until an explicit reconnect.
    assert!(connection.is_broken());
}

#[tokio::test]
async fn test_send_to_unreachable_server_is_a_connection_error() {
    // Bind then drop a listener so the port is closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut connection = Connection::new(Config::new("127.0.0.1", port));
    let err = connection
        .send(Command::Ping, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(connection.pending(), 0);
}
