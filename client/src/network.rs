use crate::game::GameSession;
use crate::input::InputManager;
use crate::rendering::Renderer;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep};

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    channel_id: Option<shared::ChannelId>,
    connected: bool,
    running: bool,

    session: GameSession,
    input_manager: InputManager,
    renderer: Renderer,

    fake_ping_ms: u64,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        fake_ping_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            channel_id: None,
            connected: false,
            running: true,
            session: GameSession::new(),
            input_manager: InputManager::new(),
            renderer: Renderer::new(),
            fake_ping_ms,
        })
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to relay server...");

        let packet = Packet::Connect { client_version: 1 };
        self.send_packet(&packet).await?;

        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        if self.fake_ping_ms > 0 {
            sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
        }

        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    async fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected { channel_id } => {
                info!("Connected! Channel ID: {}", channel_id);
                self.channel_id = Some(channel_id);
                self.connected = true;

                // Local setup is done, tell the server we want an opponent
                if let Err(e) = self.send_packet(&Packet::Ready).await {
                    error!("Error sending ready: {}", e);
                }
            }

            Packet::StartGame {
                room_id,
                referee_id,
            } => {
                if let Some(own_id) = self.channel_id {
                    self.session.start(own_id, referee_id, room_id);
                } else {
                    warn!("StartGame received before our identity was known");
                }
            }

            Packet::PaddleMove { x_position } => {
                self.session.apply_opponent_paddle(x_position);
            }

            Packet::BallMove {
                ball_x,
                ball_y,
                score,
            } => {
                // Only the mirror peer takes ball truth from the network
                if !self.session.is_referee() {
                    self.session.apply_ball_snapshot(ball_x, ball_y, score);
                }
            }

            Packet::PeerLeft => {
                self.session.peer_left();
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.channel_id = None;
                self.running = false;
            }

            _ => {
                warn!("Unexpected packet type");
            }
        }
    }

    /// Samples input, moves the local paddle and, for the referee, advances
    /// the ball. Every resulting change goes out to the opponent.
    async fn simulate_frame(&mut self, dt: f32) {
        let frame = self.input_manager.sample(dt);

        if frame.quit {
            self.running = false;
            return;
        }

        if let Some(x_position) = self.session.move_local_paddle(frame.dx) {
            if let Err(e) = self.send_packet(&Packet::PaddleMove { x_position }).await {
                error!("Error sending paddle move: {}", e);
            }
        }

        if let Some((ball_x, ball_y, score)) = self.session.step_ball() {
            let packet = Packet::BallMove {
                ball_x,
                ball_y,
                score,
            };
            if let Err(e) = self.send_packet(&packet).await {
                error!("Error sending ball move: {}", e);
            }
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut sim_interval = interval(Duration::from_millis(16));
        let mut render_interval = interval(Duration::from_millis(16));

        let mut buffer = [0u8; 2048];

        while self.running {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if self.fake_ping_ms > 0 {
                                sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
                            }

                            if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                                self.handle_packet(packet).await;
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = sim_interval.tick() => {
                    self.simulate_frame(1.0 / 60.0).await;
                },

                _ = render_interval.tick() => {
                    self.renderer.render(&self.session);
                },
            }
        }

        if self.connected {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}
