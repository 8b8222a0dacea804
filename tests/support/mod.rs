//! A miniature in-process RESP server used as the integration-test peer.
//!
//! It keeps a string/hash/list/set store behind a mutex, tracks a per-key
//! version counter so WATCH/EXEC conflict detection behaves like the real
//! thing, and fans PUBLISH messages out to subscribed connections.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Mutex;
use tokio_util::codec::Framed;

use rudis::codec::FrameCodec;
use rudis::frame::Frame;

#[derive(Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(Vec<String>),
    Set(Vec<String>),
}

#[derive(Default)]
struct State {
    values: HashMap<String, Value>,
    versions: HashMap<String, u64>,
    subscribers: Vec<(usize, String, UnboundedSender<Frame>)>,
    next_conn_id: usize,
}

impl State {
    fn bump(&mut self, key: &str) {
        *self.versions.entry(key.to_string()).or_insert(0) += 1;
    }

    fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }
}

pub struct TestServer {
    pub port: u16,
    #[allow(dead_code)]
    state: Arc<Mutex<State>>,
}

impl TestServer {
    pub async fn spawn() -> TestServer {
        TestServer::spawn_with_password(None).await
    }

    pub async fn spawn_with_password(password: Option<&str>) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let password = password.map(str::to_string);

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let (socket, _) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(_) => break,
                };
                let state = Arc::clone(&accept_state);
                let password = password.clone();
                tokio::spawn(async move {
                    handle_connection(socket, state, password).await;
                });
            }
        });

        TestServer { port, state }
    }
}

fn ok() -> Frame {
    Frame::Simple("OK".to_string())
}

fn error(message: &str) -> Frame {
    Frame::Error(message.to_string())
}

fn bulk(text: &str) -> Frame {
    Frame::Bulk(Bytes::copy_from_slice(text.as_bytes()))
}

fn bulk_array(items: &[String]) -> Frame {
    Frame::Array(items.iter().map(|item| bulk(item)).collect())
}

fn request_parts(frame: Frame) -> Option<Vec<String>> {
    let items = match frame {
        Frame::Array(items) => items,
        _ => return None,
    };
    items
        .into_iter()
        .map(|item| match item {
            Frame::Bulk(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Frame::Simple(text) => Some(text),
            _ => None,
        })
        .collect()
}

async fn handle_connection(
    socket: TcpStream,
    state: Arc<Mutex<State>>,
    password: Option<String>,
) {
    let conn_id = {
        let mut state = state.lock().await;
        state.next_conn_id += 1;
        state.next_conn_id
    };

    let mut framed = Framed::new(socket, FrameCodec);
    let (push_tx, mut push_rx) = mpsc::unbounded_channel::<Frame>();
    let mut authenticated = password.is_none();
    let mut queued: Option<Vec<Vec<String>>> = None;
    let mut watched: HashMap<String, u64> = HashMap::new();

    loop {
        let request = tokio::select! {
            // Pushes queued before a request arrived go out first, matching
            // the server-side delivery order clients rely on.
            biased;

            Some(push) = push_rx.recv() => {
                if framed.send(push).await.is_err() {
                    break;
                }
                continue;
            }
            next = framed.next() => match next {
                Some(Ok(frame)) => frame,
                _ => break,
            },
        };

        let parts = match request_parts(request) {
            Some(parts) if !parts.is_empty() => parts,
            _ => {
                let _ = framed.send(error("ERR malformed request")).await;
                continue;
            }
        };
        let command = parts[0].to_uppercase();

        // AUTH is the only command allowed before authentication succeeds.
        if !authenticated && command != "AUTH" {
            let _ = framed.send(error("NOAUTH Authentication required.")).await;
            continue;
        }

        let reply = match command.as_str() {
            "AUTH" => {
                if password.as_deref() == parts.get(1).map(String::as_str) {
                    authenticated = true;
                    ok()
                } else {
                    error("ERR invalid password")
                }
            }
            "MULTI" => {
                queued = Some(Vec::new());
                ok()
            }
            "DISCARD" => {
                queued = None;
                watched.clear();
                ok()
            }
            "EXEC" => {
                let commands = match queued.take() {
                    Some(commands) => commands,
                    None => {
                        let _ = framed.send(error("ERR EXEC without MULTI")).await;
                        continue;
                    }
                };
                let mut state = state.lock().await;
                let conflict = watched
                    .iter()
                    .any(|(key, version)| state.version(key) != *version);
                watched.clear();
                if conflict {
                    Frame::Null
                } else {
                    let replies = commands
                        .iter()
                        .map(|command| apply(&mut state, conn_id, command))
                        .collect();
                    Frame::Array(replies)
                }
            }
            "WATCH" => {
                let state = state.lock().await;
                for key in &parts[1..] {
                    watched.insert(key.clone(), state.version(key));
                }
                ok()
            }
            "UNWATCH" => {
                watched.clear();
                ok()
            }
            _ if queued.is_some() => {
                queued.as_mut().unwrap().push(parts);
                Frame::Simple("QUEUED".to_string())
            }
            "UNSUBSCRIBE" => {
                let mut state = state.lock().await;
                let channels: Vec<String> = if parts.len() > 1 {
                    parts[1..].to_vec()
                } else {
                    state
                        .subscribers
                        .iter()
                        .filter(|(id, _, _)| *id == conn_id)
                        .map(|(_, channel, _)| channel.clone())
                        .collect()
                };
                for channel in channels {
                    state
                        .subscribers
                        .retain(|(id, subscribed, _)| !(*id == conn_id && *subscribed == channel));
                    let remaining = state
                        .subscribers
                        .iter()
                        .filter(|(id, _, _)| *id == conn_id)
                        .count() as i64;
                    let confirmation = Frame::Array(vec![
                        bulk("unsubscribe"),
                        bulk(&channel),
                        Frame::Integer(remaining),
                    ]);
                    if framed.send(confirmation).await.is_err() {
                        return;
                    }
                }
                continue;
            }
            "SUBSCRIBE" => {
                let mut state = state.lock().await;
                for channel in &parts[1..] {
                    state
                        .subscribers
                        .push((conn_id, channel.clone(), push_tx.clone()));
                    let count = state
                        .subscribers
                        .iter()
                        .filter(|(id, _, _)| *id == conn_id)
                        .count() as i64;
                    let confirmation = Frame::Array(vec![
                        bulk("subscribe"),
                        bulk(channel),
                        Frame::Integer(count),
                    ]);
                    if framed.send(confirmation).await.is_err() {
                        return;
                    }
                }
                continue;
            }
            _ => {
                let mut state = state.lock().await;
                apply(&mut state, conn_id, &parts)
            }
        };

        if framed.send(reply).await.is_err() {
            break;
        }
    }

    let mut state = state.lock().await;
    state.subscribers.retain(|(id, _, _)| *id != conn_id);
}

/// Applies one data command against the shared store and returns its reply.
fn apply(state: &mut State, _conn_id: usize, parts: &[String]) -> Frame {
    let command = parts[0].to_uppercase();
    let arg = |index: usize| parts.get(index).cloned().unwrap_or_default();

    match command.as_str() {
        "PING" => match parts.get(1) {
            Some(message) => bulk(message),
            None => Frame::Simple("PONG".to_string()),
        },
        "ECHO" => bulk(&arg(1)),
        "SELECT" => ok(),
        "QUIT" => ok(),
        "FLUSHDB" | "FLUSHALL" => {
            state.values.clear();
            ok()
        }
        "DBSIZE" => Frame::Integer(state.values.len() as i64),
        "SET" => {
            let key = arg(1);
            let options: Vec<String> = parts[3..].iter().map(|p| p.to_uppercase()).collect();
            if options.iter().any(|o| o == "NX") && state.values.contains_key(&key) {
                return Frame::Null;
            }
            if options.iter().any(|o| o == "XX") && !state.values.contains_key(&key) {
                return Frame::Null;
            }
            state.values.insert(key.clone(), Value::Str(arg(2)));
            state.bump(&key);
            ok()
        }
        "GET" => match state.values.get(&arg(1)) {
            Some(Value::Str(value)) => bulk(value),
            Some(_) => error("WRONGTYPE Operation against a key holding the wrong kind of value"),
            None => Frame::Null,
        },
        "DEL" => {
            let mut removed = 0;
            for key in &parts[1..] {
                if state.values.remove(key).is_some() {
                    removed += 1;
                    state.bump(key);
                }
            }
            Frame::Integer(removed)
        }
        "EXISTS" => {
            let found = parts[1..]
                .iter()
                .filter(|key| state.values.contains_key(*key))
                .count();
            Frame::Integer(found as i64)
        }
        "TYPE" => {
            let kind = match state.values.get(&arg(1)) {
                Some(Value::Str(_)) => "string",
                Some(Value::Hash(_)) => "hash",
                Some(Value::List(_)) => "list",
                Some(Value::Set(_)) => "set",
                None => "none",
            };
            Frame::Simple(kind.to_string())
        }
        "INCR" | "INCRBY" | "DECR" | "DECRBY" => {
            let key = arg(1);
            let step: i64 = match command.as_str() {
                "INCR" => 1,
                "DECR" => -1,
                "INCRBY" => arg(2).parse().unwrap_or(0),
                _ => -arg(2).parse().unwrap_or(0),
            };
            let current: i64 = match state.values.get(&key) {
                Some(Value::Str(value)) => match value.parse() {
                    Ok(number) => number,
                    Err(_) => return error("ERR value is not an integer or out of range"),
                },
                Some(_) => return error("WRONGTYPE"),
                None => 0,
            };
            let next = current + step;
            state.values.insert(key.clone(), Value::Str(next.to_string()));
            state.bump(&key);
            Frame::Integer(next)
        }
        "EXPIRE" | "PEXPIRE" => {
            Frame::Integer(if state.values.contains_key(&arg(1)) { 1 } else { 0 })
        }
        "TTL" | "PTTL" => {
            Frame::Integer(if state.values.contains_key(&arg(1)) { 100 } else { -2 })
        }
        "KEYS" => {
            let keys: Vec<String> = state.values.keys().cloned().collect();
            bulk_array(&keys)
        }
        "SCAN" => {
            let keys: Vec<String> = state.values.keys().cloned().collect();
            Frame::Array(vec![bulk("0"), bulk_array(&keys)])
        }
        "HSET" | "HSETNX" => {
            let key = arg(1);
            let entry = state
                .values
                .entry(key.clone())
                .or_insert_with(|| Value::Hash(HashMap::new()));
            let hash = match entry {
                Value::Hash(hash) => hash,
                _ => return error("WRONGTYPE"),
            };
            if command == "HSETNX" && hash.contains_key(&arg(2)) {
                return Frame::Integer(0);
            }
            let created = !hash.contains_key(&arg(2));
            hash.insert(arg(2), arg(3));
            state.bump(&key);
            Frame::Integer(if created { 1 } else { 0 })
        }
        "HGET" => match state.values.get(&arg(1)) {
            Some(Value::Hash(hash)) => match hash.get(&arg(2)) {
                Some(value) => bulk(value),
                None => Frame::Null,
            },
            Some(_) => error("WRONGTYPE"),
            None => Frame::Null,
        },
        "HGETALL" => match state.values.get(&arg(1)) {
            Some(Value::Hash(hash)) => {
                let mut flat = Vec::new();
                for (field, value) in hash {
                    flat.push(field.clone());
                    flat.push(value.clone());
                }
                bulk_array(&flat)
            }
            Some(_) => error("WRONGTYPE"),
            None => Frame::Array(vec![]),
        },
        "LPUSH" | "RPUSH" => {
            let key = arg(1);
            let entry = state
                .values
                .entry(key.clone())
                .or_insert_with(|| Value::List(Vec::new()));
            let list = match entry {
                Value::List(list) => list,
                _ => return error("WRONGTYPE"),
            };
            for element in &parts[2..] {
                if command == "LPUSH" {
                    list.insert(0, element.clone());
                } else {
                    list.push(element.clone());
                }
            }
            let length = list.len() as i64;
            state.bump(&key);
            Frame::Integer(length)
        }
        "LPOP" | "RPOP" => {
            let key = arg(1);
            let popped = match state.values.get_mut(&key) {
                Some(Value::List(list)) if !list.is_empty() => Some(if command == "LPOP" {
                    list.remove(0)
                } else {
                    list.pop().unwrap()
                }),
                _ => None,
            };
            match popped {
                Some(element) => {
                    state.bump(&key);
                    bulk(&element)
                }
                None => Frame::Null,
            }
        }
        "BLPOP" => {
            // Non-blocking rendition: answer immediately from the list or
            // report the timeout-expired shape.
            let key = arg(1);
            let popped = match state.values.get_mut(&key) {
                Some(Value::List(list)) if !list.is_empty() => Some(list.remove(0)),
                _ => None,
            };
            match popped {
                Some(element) => {
                    state.bump(&key);
                    Frame::Array(vec![bulk(&key), bulk(&element)])
                }
                None => Frame::Null,
            }
        }
        "LLEN" => match state.values.get(&arg(1)) {
            Some(Value::List(list)) => Frame::Integer(list.len() as i64),
            _ => Frame::Integer(0),
        },
        "LRANGE" => match state.values.get(&arg(1)) {
            Some(Value::List(list)) => {
                let len = list.len() as i64;
                let index = |raw: i64| if raw < 0 { len + raw } else { raw };
                let start = index(arg(2).parse().unwrap_or(0)).max(0) as usize;
                let stop = index(arg(3).parse().unwrap_or(-1)).min(len - 1);
                if stop < start as i64 {
                    Frame::Array(vec![])
                } else {
                    bulk_array(&list[start..=stop as usize])
                }
            }
            _ => Frame::Array(vec![]),
        },
        "SADD" => {
            let key = arg(1);
            let entry = state
                .values
                .entry(key.clone())
                .or_insert_with(|| Value::Set(Vec::new()));
            let set = match entry {
                Value::Set(set) => set,
                _ => return error("WRONGTYPE"),
            };
            let mut added = 0;
            for member in &parts[2..] {
                if !set.contains(member) {
                    set.push(member.clone());
                    added += 1;
                }
            }
            state.bump(&key);
            Frame::Integer(added)
        }
        "SMEMBERS" => match state.values.get(&arg(1)) {
            Some(Value::Set(set)) => bulk_array(set),
            _ => Frame::Array(vec![]),
        },
        "SCARD" => match state.values.get(&arg(1)) {
            Some(Value::Set(set)) => Frame::Integer(set.len() as i64),
            _ => Frame::Integer(0),
        },
        "PUBLISH" => {
            let channel = arg(1);
            let payload = arg(2);
            let mut receivers = 0;
            for (_, subscribed, tx) in &state.subscribers {
                if *subscribed == channel {
                    let push = Frame::Array(vec![
                        bulk("message"),
                        bulk(&channel),
                        bulk(&payload),
                    ]);
                    if tx.send(push).is_ok() {
                        receivers += 1;
                    }
                }
            }
            Frame::Integer(receivers)
        }
        _ => error("ERR unknown command"),
    }
}
