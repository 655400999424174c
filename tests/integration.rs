use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use sandftp::client::handle_client;
use sandftp::config::UserEntry;
use sandftp::{Server, ServerConfig};

const WAIT: Duration = Duration::from_secs(10);

/// Line-oriented control-channel client.
struct Control<S> {
    stream: BufReader<S>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Control<S> {
    async fn new(stream: S) -> Self {
        let mut control = Self {
            stream: BufReader::new(stream),
        };
        let greeting = control.reply().await;
        assert!(greeting.starts_with("220"), "greeting: {}", greeting);
        control
    }

    /// Reads one complete reply, following multi-line continuations.
    async fn reply(&mut self) -> String {
        let mut text = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            let n = timeout(WAIT, self.stream.read_line(&mut line))
                .await
                .expect("reply timed out")
                .unwrap();
            assert!(n > 0, "control connection closed");
            text.push_str(&line);
            let bytes = line.as_bytes();
            if bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b' ' {
                return text;
            }
        }
    }

    async fn send(&mut self, command: &str) {
        let stream = self.stream.get_mut();
        stream
            .write_all(format!("{}\r\n", command).as_bytes())
            .await
            .unwrap();
        stream.flush().await.unwrap();
    }

    async fn cmd(&mut self, command: &str) -> String {
        self.send(command).await;
        self.reply().await
    }
}

/// Data root with `anonymous/` and `foo/` user directories.
fn data_root(dir: &Path) -> std::path::PathBuf {
    let root = dir.join("Data");
    fs::create_dir_all(root.join("anonymous/pub")).unwrap();
    fs::write(root.join("anonymous/readme.txt"), b"welcome\n").unwrap();
    fs::create_dir_all(root.join("foo")).unwrap();
    fs::write(root.join("foo/report.bin"), [0u8, 1, 2, 13, 10, 255]).unwrap();
    root
}

fn test_config(dir: &Path, passive: (u16, u16)) -> ServerConfig {
    ServerConfig {
        control_port: 0,
        passive_port_min: passive.0,
        passive_port_max: passive.1,
        data_root: data_root(dir),
        data_connection_timeout_secs: 5,
        users: vec![UserEntry::new("anonymous", ""), UserEntry::new("foo", "bar")],
        ..ServerConfig::default()
    }
}

async fn start(config: ServerConfig) -> (SocketAddr, JoinHandle<()>) {
    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        server.run().await.unwrap();
    });
    (addr, handle)
}

async fn connect(addr: SocketAddr) -> Control<TcpStream> {
    Control::new(TcpStream::connect(addr).await.unwrap()).await
}

/// Extracts the endpoint from `227 Entering Passive Mode (a,b,c,d,p1,p2)`.
fn passive_endpoint(reply: &str) -> SocketAddr {
    let start = reply.find('(').unwrap() + 1;
    let end = reply.find(')').unwrap();
    let n: Vec<u16> = reply[start..end]
        .split(',')
        .map(|field| field.trim().parse().unwrap())
        .collect();
    let ip = std::net::Ipv4Addr::new(n[0] as u8, n[1] as u8, n[2] as u8, n[3] as u8);
    SocketAddr::from((ip, n[4] * 256 + n[5]))
}

async fn read_all(mut stream: TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    timeout(WAIT, stream.read_to_end(&mut buf))
        .await
        .unwrap()
        .unwrap();
    buf
}

#[tokio::test]
async fn anonymous_passive_listing() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _server) = start(test_config(dir.path(), (47500, 47520))).await;
    let mut control = connect(addr).await;

    assert!(control.cmd("USER anonymous").await.starts_with("230"));

    let pasv = control.cmd("PASV").await;
    assert!(pasv.starts_with("227 Entering Passive Mode ("), "{}", pasv);
    let endpoint = passive_endpoint(&pasv);
    assert!((47500..=47520).contains(&endpoint.port()));

    let data = TcpStream::connect(endpoint).await.unwrap();
    control.send("LIST").await;
    assert!(control.reply().await.starts_with("150"));
    let listing = String::from_utf8(read_all(data).await).unwrap();
    assert!(control.reply().await.starts_with("226"));

    assert_eq!(
        listing,
        "d          0 pub\r\n-          8 readme.txt\r\n"
    );

    // The listener stays usable until the next PASV.
    let data = TcpStream::connect(endpoint).await.unwrap();
    control.send("RETR readme.txt").await;
    assert!(control.reply().await.starts_with("150"));
    assert_eq!(read_all(data).await, b"welcome\n");
    assert!(control.reply().await.starts_with("226"));

    assert!(control.cmd("QUIT").await.starts_with("221"));
}

#[tokio::test]
async fn missing_file_keeps_session_open() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _server) = start(test_config(dir.path(), (47530, 47550))).await;
    let mut control = connect(addr).await;

    assert!(control.cmd("USER foo").await.starts_with("331"));
    assert!(control.cmd("PASS bar").await.starts_with("230"));
    assert!(control.cmd("RETR missing.txt").await.starts_with("550"));
    assert!(control.cmd("NOOP").await.starts_with("200"));
    assert!(control.cmd("RETR ../../etc/passwd").await.starts_with("550"));
    assert!(control.cmd("PWD").await.starts_with("257 \"/\""));
}

#[tokio::test]
async fn active_mode_retrieval_is_binary_exact() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _server) = start(test_config(dir.path(), (47560, 47580))).await;
    let mut control = connect(addr).await;

    control.cmd("USER foo").await;
    control.cmd("PASS bar").await;

    let receiver = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = receiver.local_addr().unwrap().port();
    let reply = control
        .cmd(&format!("PORT 127,0,0,1,{},{}", port / 256, port % 256))
        .await;
    assert!(reply.starts_with("200"), "{}", reply);

    control.send("RETR report.bin").await;
    let (data, _) = timeout(WAIT, receiver.accept()).await.unwrap().unwrap();
    assert!(control.reply().await.starts_with("150"));
    assert_eq!(read_all(data).await, vec![0u8, 1, 2, 13, 10, 255]);
    assert!(control.reply().await.starts_with("226"));
}

#[tokio::test]
async fn sequencing_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _server) = start(test_config(dir.path(), (47590, 47610))).await;
    let mut control = connect(addr).await;

    assert!(control.cmd("LIST").await.starts_with("530"));
    assert!(control.cmd("PASS bar").await.starts_with("503"));
    assert!(control.cmd("USER mallory").await.starts_with("530"));
    assert!(control.cmd("FROB").await.starts_with("502"));
    assert!(control.cmd("CWD").await.starts_with("501"));
    assert!(control.cmd(&"X".repeat(600)).await.starts_with("500"));

    control.cmd("USER foo").await;
    assert!(control.cmd("PASS wrong").await.starts_with("530"));
    assert!(control.cmd("PASS bar").await.starts_with("503"));
    control.cmd("USER foo").await;
    assert!(control.cmd("PASS bar").await.starts_with("230"));
    assert!(control.cmd("LIST").await.starts_with("425"));
    assert!(control.cmd("CWD ../../..").await.starts_with("250"));
    assert!(control.cmd("PWD").await.starts_with("257 \"/\""));
}

#[tokio::test]
async fn remote_shutdown_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let server = Server::bind(test_config(dir.path(), (47620, 47640)))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let context = server.context();
    let signal = server.shutdown_signal();
    let _server = tokio::spawn(async move { server.run().await.unwrap() });

    let (client, server_side) = tokio::io::duplex(4096);
    let peer: SocketAddr = "203.0.113.7:40123".parse().unwrap();
    let session = tokio::spawn(handle_client(server_side, peer, addr, context));

    let mut control = Control::new(client).await;
    assert!(control.cmd("SHUTDOWN").await.starts_with("550"));
    assert!(control.cmd("NOOP").await.starts_with("200"));
    assert!(!signal.is_triggered());

    // Still accepting.
    let mut other = connect(addr).await;
    assert!(other.cmd("QUIT").await.starts_with("221"));

    assert!(control.cmd("QUIT").await.starts_with("221"));
    timeout(WAIT, session).await.unwrap().unwrap();
}

#[tokio::test]
async fn loopback_shutdown_stops_listener() {
    let dir = tempfile::tempdir().unwrap();
    let server = Server::bind(test_config(dir.path(), (47650, 47670)))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let running = tokio::spawn(async move { server.run().await });

    let mut control = connect(addr).await;
    assert!(control.cmd("SHUTDOWN").await.starts_with("221"));

    let mut rest = String::new();
    let n = control.stream.read_line(&mut rest).await.unwrap();
    assert_eq!(n, 0, "session should be closed");

    timeout(WAIT, running).await.unwrap().unwrap().unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn connection_limit_turns_clients_away() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        max_clients: 1,
        ..test_config(dir.path(), (47680, 47700))
    };
    let (addr, _server) = start(config).await;

    let mut first = connect(addr).await;
    let mut second = BufReader::new(TcpStream::connect(addr).await.unwrap());
    let mut line = String::new();
    timeout(WAIT, second.read_line(&mut line)).await.unwrap().unwrap();
    assert_eq!(line, "421 Too many connections. Try again later.\r\n");

    assert!(first.cmd("NOOP").await.starts_with("200"));
}
