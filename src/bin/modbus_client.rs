// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simple Modbus client for inspecting the simulator's register areas
//!
//! Connects to a running simulator and dumps the current contents of all
//! four register areas, as a quick inspection surface and a smoke test for
//! the server.
//!
//! ## Usage
//!
//! First, start the simulator:
//! ```bash
//! cargo run --bin modbus_slave_sim -- --config config.yaml
//! ```
//!
//! Then run this client:
//! ```bash
//! cargo run --bin modbus_client -- 127.0.0.1:502 0 8
//! ```
//!
//! The optional arguments are the server address, the starting address and
//! the number of cells to read from each area.

use tokio_modbus::client::{tcp::connect, Client, Reader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let server_address = args.next().unwrap_or_else(|| "127.0.0.1:502".to_string());
    let start: u16 = args.next().as_deref().unwrap_or("0").parse()?;
    let count: u16 = args.next().as_deref().unwrap_or("2").parse()?;

    println!("🔌 Modbus Slave Simulator Client");
    println!("=====================================");
    println!("Connecting to Modbus server at {}", server_address);

    let socket_addr: std::net::SocketAddr = server_address.parse()?;

    let mut ctx = match connect(socket_addr).await {
        Ok(ctx) => {
            println!("✅ Successfully connected to Modbus server");
            ctx
        }
        Err(e) => {
            eprintln!("❌ Failed to connect to Modbus server: {}", e);
            eprintln!("💡 Make sure the simulator is running with Modbus enabled");
            return Err(e.into());
        }
    };

    println!("\n📊 Coils (0x01):");
    match ctx.read_coils(start, count).await {
        Ok(Ok(bits)) => {
            for (i, bit) in bits.iter().enumerate() {
                println!("  Address {}: {}", start + i as u16, u8::from(*bit));
            }
        }
        Ok(Err(exception)) => eprintln!("  Exception: {exception}"),
        Err(e) => eprintln!("  Error: {e}"),
    }

    println!("\n📊 Discrete Inputs (0x02):");
    match ctx.read_discrete_inputs(start, count).await {
        Ok(Ok(bits)) => {
            for (i, bit) in bits.iter().enumerate() {
                println!("  Address {}: {}", start + i as u16, u8::from(*bit));
            }
        }
        Ok(Err(exception)) => eprintln!("  Exception: {exception}"),
        Err(e) => eprintln!("  Error: {e}"),
    }

    println!("\n📊 Holding Registers (0x03):");
    match ctx.read_holding_registers(start, count).await {
        Ok(Ok(words)) => {
            for (i, word) in words.iter().enumerate() {
                println!("  Address {}: {}", start + i as u16, word);
            }
        }
        Ok(Err(exception)) => eprintln!("  Exception: {exception}"),
        Err(e) => eprintln!("  Error: {e}"),
    }

    println!("\n📊 Input Registers (0x04):");
    match ctx.read_input_registers(start, count).await {
        Ok(Ok(words)) => {
            for (i, word) in words.iter().enumerate() {
                println!("  Address {}: {}", start + i as u16, word);
            }
        }
        Ok(Err(exception)) => eprintln!("  Exception: {exception}"),
        Err(e) => eprintln!("  Error: {e}"),
    }

    ctx.disconnect().await?;
    println!("\n👋 Disconnected");

    Ok(())
}
