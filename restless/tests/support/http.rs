use std::{io, net::SocketAddr};

use axum::Router;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// 実ポートで動くテスト用HTTPサーバー
#[allow(dead_code)]
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), io::Error>>,
}

#[allow(dead_code)]
impl TestServer {
    /// バインドしているアドレス
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// ベースURL
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// サーバーを停止し、バックグラウンドタスクの終了を待つ
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

/// ルーターを127.0.0.1の空きポートで起動する
#[allow(dead_code)]
pub async fn spawn_app(router: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
    });
    TestServer {
        addr,
        shutdown: Some(tx),
        handle,
    }
}
