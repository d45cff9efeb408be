// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Background service management for the simulator
//!
//! Coordinates the three long-running tasks of a server instance: the
//! register update scheduler (the sole writer of register contents), the
//! Modbus TCP listener and a heartbeat monitor. Shutdown is cooperative: a
//! shared atomic flag is checked at every loop boundary, so no tick is
//! interrupted mid-execution and no new tick starts after the flag drops.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_modbus::server::tcp::{accept_tcp_connection, Server};

use crate::config::Config;
use crate::modbus::{SimulatorModbusServer, SlaveTable};
use crate::simulator::Simulator;

/// Represents a daemon task manager that coordinates the simulator's
/// background services
///
/// This structure maintains a collection of asynchronous tasks and provides
/// methods to start, stop, and monitor them.
///
/// # Fields
///
/// * `tasks` - Collection of handles to running tasks for management and cleanup
/// * `running` - Atomic flag shared between tasks to coordinate shutdown
/// * `simulator` - The simulated device all tasks operate on
///
/// # Thread Safety
///
/// The `running` flag is wrapped in an `Arc` to allow safe sharing between
/// multiple tasks. Each task checks this flag periodically to determine if it
/// should continue running or gracefully terminate.
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    simulator: Option<Arc<Simulator>>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// Initializes a new daemon manager with an empty task list and the
    /// running flag set to `true`. The simulator is created on
    /// [`launch`](Daemon::launch), once the configuration is known.
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            simulator: None,
        }
    }

    /// The simulated device, available after [`launch`](Daemon::launch).
    ///
    /// Control surfaces (CLI, tests, an embedding GUI) use this handle for
    /// `set_mode`, `add_override` and `snapshot`.
    pub fn simulator(&self) -> Option<Arc<Simulator>> {
        self.simulator.clone()
    }

    /// Launch all configured tasks based on configuration
    ///
    /// Builds the simulator (windows and initial register contents are fully
    /// initialized before anything else starts), then starts the update
    /// scheduler, the Modbus TCP server when enabled, and the heartbeat.
    ///
    /// # Parameters
    ///
    /// * `config` - Application configuration containing service settings
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Success if all tasks started successfully, or error details
    ///
    /// # Errors
    ///
    /// This function can fail if the Modbus server fails to bind to the
    /// configured address and port.
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        let simulator = Arc::new(Simulator::new(&config.simulation));
        self.simulator = Some(simulator.clone());

        // The bank snapshot exists before the listener accepts its first
        // connection, so the scheduler may start in any order relative to it.
        self.start_update_scheduler(config, simulator.clone())?;

        if config.modbus.enabled {
            self.start_modbus_server(config, simulator).await?;
        }

        self.start_heartbeat()?;

        Ok(())
    }

    /// Launch the register update scheduler
    ///
    /// Spawns the single background task that rewrites register contents:
    /// one tick per configured interval, each tick generating, overlaying
    /// and publishing all four areas. A failing tick is logged and skipped;
    /// the loop continues at the next interval. The task observes the
    /// shutdown flag at each loop boundary.
    fn start_update_scheduler(
        &mut self,
        config: &Config,
        simulator: Arc<Simulator>,
    ) -> Result<()> {
        let interval = Duration::from_secs_f64(config.simulation.update_interval);
        info!(
            "Starting register update scheduler (interval {:.3}s, initial mode {})",
            config.simulation.update_interval,
            simulator.mode()
        );

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                if let Err(e) = simulator.tick() {
                    error!("Register update tick failed, skipping: {e}");
                }
                time::sleep(interval).await;
            }
            info!("Register update scheduler stopped");
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Launch the Modbus server daemon
    ///
    /// Binds the TCP listener, then spawns a task that serves connections
    /// until the daemon's `running` flag drops. Each accepted connection gets
    /// a service instance resolved from the unit-id table.
    ///
    /// # Errors
    ///
    /// This function can fail if:
    /// * The server fails to bind to the specified address/port
    /// * The socket address is invalid
    async fn start_modbus_server(
        &mut self,
        config: &Config,
        simulator: Arc<Simulator>,
    ) -> Result<()> {
        info!(
            "Starting modbus server on {}:{} (unit id {})",
            config.modbus.address, config.modbus.port, config.modbus.unit_id
        );

        let socket_addr: SocketAddr = format!("{}:{}", config.modbus.address, config.modbus.port)
            .parse()
            .context("Invalid Modbus socket address")?;

        // Bind before spawning so startup failures surface to the caller and
        // no client connects before the bank is initialized.
        let listener = TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("Failed to bind Modbus server to {socket_addr}"))?;

        let unit_id = config.modbus.unit_id;
        let table = Arc::new(SlaveTable::single(unit_id, simulator));
        let running = self.running.clone();

        let task = tokio::spawn(async move {
            let server = Server::new(listener);

            let on_connected = move |stream, socket_addr| {
                let table = table.clone();
                async move {
                    debug!("Modbus client connected from {socket_addr}");
                    accept_tcp_connection(stream, socket_addr, move |_socket_addr| {
                        Ok(table.get(unit_id).map(SimulatorModbusServer::new))
                    })
                }
            };

            let on_process_error = |err| {
                error!("Modbus server error: {err}");
            };

            // Start the server in a separate task
            let server_handle = tokio::spawn(async move {
                if let Err(e) = server.serve(&on_connected, on_process_error).await {
                    error!("Modbus server error: {}", e);
                }
            });

            while running.load(Ordering::SeqCst) {
                // Check every second if we should continue running
                time::sleep(Duration::from_secs(1)).await;
            }

            // The running flag is now false, which means we need to shut down
            info!("Shutting down Modbus server...");

            // Explicitly abort the server task if it's still running
            server_handle.abort();

            // Wait for the server to shut down with a timeout; failures here
            // are logged and swallowed, never propagated to the stop caller.
            match tokio::time::timeout(Duration::from_secs(5), server_handle).await {
                Ok(_) => info!("Modbus server shut down successfully"),
                Err(_) => {
                    warn!("Modbus server shutdown timed out, forcing termination");
                }
            }

            Ok(())
        });

        self.tasks.push(task);
        info!("Modbus server started");
        Ok(())
    }

    /// Start the heartbeat monitoring task
    ///
    /// Emits a periodic debug log line alongside the timestamp of the last
    /// completed tick, so an external monitor can detect a stalled scheduler.
    fn start_heartbeat(&mut self) -> Result<()> {
        info!("Starting heartbeat monitor");

        let running = self.running.clone();
        let simulator = self.simulator.clone();
        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let last_tick = simulator.as_ref().and_then(|s| s.last_tick());
                debug!("Daemon heartbeat: running, last tick: {last_tick:?}");
                time::sleep(Duration::from_secs(60)).await;
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Signal all tasks to stop
    ///
    /// Tasks check the running flag at their loop boundaries and terminate
    /// gracefully; an in-flight tick always completes.
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Wait for all tasks to complete
    ///
    /// Consumes the daemon and waits for all spawned tasks to finish
    /// execution. This method should be called after `shutdown()` to ensure a
    /// clean application exit.
    ///
    /// If any task panics, the error is logged but this method will still
    /// wait for all other tasks to complete.
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match tokio::time::timeout(Duration::from_secs(5), task).await {
                Ok(result) => {
                    if let Err(e) = result {
                        log::error!("Task panicked: {}", e);
                    }
                }
                Err(_) => {
                    // Task didn't complete within timeout
                    log::warn!("Task did not complete within timeout period, may be hung");
                }
            }
        }
        Ok(())
    }
}
