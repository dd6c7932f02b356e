use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    thread::{self, JoinHandle},
};

use echo_socket::{
    EchoHandler, Opcode, ServerConfig, SessionError, WebSocketClient, WebSocketServer, handshake,
};

const REQUEST: &str = "GET /chat HTTP/1.1\r\n\
    Host: localhost\r\n\
    Upgrade: websocket\r\n\
    Connection: Upgrade\r\n\
    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
    Sec-WebSocket-Version: 13\r\n\r\n";

const RESPONSE: &str = "HTTP/1.1 101 Switching Protocols\r\n\
    Upgrade: websocket\r\n\
    Connection: Upgrade\r\n\
    Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n";

// Binds on an ephemeral port and serves exactly one client on a thread
fn spawn_server() -> (SocketAddr, JoinHandle<()>) {
    let config = ServerConfig {
        port: 0,
        once: true,
        ..ServerConfig::default()
    };
    let server = WebSocketServer::bind(&config).unwrap();
    let addr = server.addr().unwrap();
    let handle = thread::spawn(move || server.run(&mut EchoHandler).unwrap());
    (addr, handle)
}

fn read_until_blank_line(stream: &mut TcpStream) -> String {
    let mut out = Vec::new();
    let mut byte = [0];
    while !out.ends_with(b"\r\n\r\n") {
        assert_eq!(stream.read(&mut byte).unwrap(), 1, "connection closed early");
        out.push(byte[0]);
    }
    String::from_utf8(out).unwrap()
}

#[test]
fn client_gets_echo() {
    let (addr, server) = spawn_server();

    let mut ws = WebSocketClient::connect(&format!("ws://{addr}/")).unwrap();
    assert_eq!(ws.peer_addr(), addr);

    ws.send_text("hi").unwrap();
    let frame = ws.recv().unwrap();
    assert_eq!(frame.opcode, Opcode::Text);
    assert!(frame.fin);
    assert_eq!(frame.text(), "Server Echo: hi");

    let long = "lorem ipsum ".repeat(40);
    ws.send_text(&long).unwrap();
    assert_eq!(ws.recv().unwrap().text(), format!("Server Echo: {long}"));

    ws.close().unwrap();
    server.join().unwrap();
}

#[test]
fn raw_handshake_matches_rfc_vector() {
    let (addr, server) = spawn_server();

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(REQUEST.as_bytes()).unwrap();
    assert_eq!(read_until_blank_line(&mut stream), RESPONSE);

    // RFC 6455 §5.7 masked "Hello"
    stream
        .write_all(&[0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58])
        .unwrap();
    let mut reply = [0; 2 + 18];
    stream.read_exact(&mut reply).unwrap();
    assert_eq!(&reply[..2], &[0x81, 18]);
    assert_eq!(&reply[2..], b"Server Echo: Hello");

    drop(stream);
    server.join().unwrap();
}

#[test]
fn request_without_key_is_dropped() {
    let (addr, server) = spawn_server();

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .unwrap();

    // no response, the server just drops the connection
    let mut buf = [0; 64];
    let n = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0);

    server.join().unwrap();
}

#[test]
fn truncated_frame_is_dropped() {
    let (addr, server) = spawn_server();

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(REQUEST.as_bytes()).unwrap();
    read_until_blank_line(&mut stream);

    // claims 1000 bytes, carries 10
    let mut frame = vec![0x81, 0xfe, 0x03, 0xe8, 1, 2, 3, 4];
    frame.extend_from_slice(&[0; 10]);
    stream.write_all(&frame).unwrap();

    let mut buf = [0; 64];
    let n = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0);

    server.join().unwrap();
}

// Accepts one client, answers its upgrade and then writes `after` verbatim
fn spawn_scripted_server(after: Vec<u8>) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_until_blank_line(&mut stream);
        let key = handshake::extract_key(&request).unwrap();
        let mut out = format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: {}\r\n\r\n",
            handshake::accept_token(key)
        )
        .into_bytes();
        out.extend_from_slice(&after);
        // one write so the frame lands in the same segment as the headers
        stream.write_all(&out).unwrap();

        // hold the connection open until the client hangs up
        let mut sink = [0; 64];
        while matches!(stream.read(&mut sink), Ok(n) if n > 0) {}
    });
    (addr, handle)
}

#[test]
fn frame_sent_with_upgrade_response_is_kept() {
    let (addr, server) = spawn_scripted_server(vec![0x81, 0x05, b'h', b'e', b'l', b'l', b'o']);

    let mut ws = WebSocketClient::connect(&format!("ws://{addr}/")).unwrap();
    let frame = ws.recv().unwrap();
    assert_eq!(frame.opcode, Opcode::Text);
    assert_eq!(frame.text(), "hello");

    ws.close().unwrap();
    server.join().unwrap();
}

#[test]
fn oversized_frame_is_refused() {
    // 64-bit length of 2^40, followed by some filler
    let mut after = vec![0x81, 0x7f];
    after.extend_from_slice(&(1u64 << 40).to_be_bytes());
    after.extend_from_slice(&[0xAB; 1024]);
    let (addr, server) = spawn_scripted_server(after);

    let mut ws = WebSocketClient::connect(&format!("ws://{addr}/"))
        .unwrap()
        .with_max_frame_size(4096);
    match ws.recv() {
        Err(SessionError::FrameTooLarge { size, max }) => {
            assert_eq!(size, 10 + (1u64 << 40));
            assert_eq!(max, 4096);
        }
        other => panic!("expected FrameTooLarge, got {other:?}"),
    }

    ws.close().unwrap();
    server.join().unwrap();
}
