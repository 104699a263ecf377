use anyhow::anyhow;
use rocket::fairing::Info;
use rocket::{Orbit, Rocket};
use tokio::sync::{mpsc, Mutex};

/// A fairing that reports the port Rocket actually bound, plus the handle
/// that receives it. Lets the server listen on port 0.
pub fn create_pair() -> (PortSaver, Port) {
    let (tx, rx) = mpsc::channel(1);
    let port_saver = PortSaver::new(tx);
    let port = Port::new(rx);
    (port_saver, port)
}

pub struct Port {
    port: Mutex<Option<u16>>,
    rx: Mutex<mpsc::Receiver<u16>>,
}

impl Port {
    fn new(rx: mpsc::Receiver<u16>) -> Port {
        Port {
            port: Mutex::new(None),
            rx: Mutex::new(rx),
        }
    }

    /// Waits for liftoff on the first call.
    pub async fn get(&self) -> Result<u16, anyhow::Error> {
        let mut port_guard = self.port.lock().await;
        match *port_guard {
            Some(port) => Ok(port),
            None => {
                let mut rx_guard = self.rx.lock().await;
                let port = rx_guard
                    .recv()
                    .await
                    .ok_or_else(|| anyhow!("The server shut down before reporting its port."))?;
                *port_guard = Some(port);
                Ok(port)
            }
        }
    }
}

pub struct PortSaver {
    sender: mpsc::Sender<u16>,
}

impl PortSaver {
    fn new(sender: mpsc::Sender<u16>) -> PortSaver {
        PortSaver { sender }
    }
}

#[rocket::async_trait]
impl rocket::fairing::Fairing for PortSaver {
    fn info(&self) -> Info {
        Info {
            name: "Port Saver",
            kind: rocket::fairing::Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        if self.sender.send(rocket.config().port).await.is_err() {
            tracing::warn!("Nobody is waiting for the bound port");
        }
    }
}
