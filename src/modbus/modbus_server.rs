// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus server implementation for the register simulator
//!
//! For avoiding confusion with the Modbus master/slave terminology, this module uses
//! the terms "server" and "client" instead. The server is the device that provides data,
//! while the client is the device that requests data.
//!
//! The server answers the four read function codes from the simulator's
//! register bank:
//!
//! | Function Code | Request | Area |
//! |---------------|---------|------|
//! | 0x01 | Read Coils | coils |
//! | 0x02 | Read Discrete Inputs | discrete inputs |
//! | 0x03 | Read Holding Registers | holding registers |
//! | 0x04 | Read Input Registers | input registers |
//!
//! Every write function code is answered with an IllegalFunction exception:
//! register contents only ever change through the simulator's own generation
//! and override paths, never through inbound protocol writes. Reads outside a
//! configured window are answered with IllegalDataAddress.

use std::{collections::HashMap, future, sync::Arc};

use log::{debug, error};

use tokio_modbus::prelude::*;

use crate::simulator::{RegisterClass, Simulator, SimulatorError};

/// Mapping from unit (slave) identifier to the simulator answering under it.
///
/// A running server instance carries one entry today; the table is the
/// generalization point for serving several differently-configured units
/// behind a single endpoint.
#[derive(Default)]
pub struct SlaveTable {
    units: HashMap<SlaveId, Arc<Simulator>>,
}

impl SlaveTable {
    /// A table with a single unit, the common case.
    pub fn single(unit_id: SlaveId, simulator: Arc<Simulator>) -> Self {
        let mut units = HashMap::new();
        units.insert(unit_id, simulator);
        Self { units }
    }

    /// Register a simulator under a unit id.
    pub fn insert(&mut self, unit_id: SlaveId, simulator: Arc<Simulator>) {
        self.units.insert(unit_id, simulator);
    }

    /// The simulator answering under `unit_id`, if any.
    pub fn get(&self, unit_id: SlaveId) -> Option<Arc<Simulator>> {
        self.units.get(&unit_id).cloned()
    }
}

/// A Modbus TCP service answering read requests from one simulator.
///
/// One instance is built per accepted connection; all instances share the
/// same `Arc<Simulator>`, whose register bank carries the locking that makes
/// concurrent reads and scheduler publishes safe.
pub struct SimulatorModbusServer {
    simulator: Arc<Simulator>,
}

impl SimulatorModbusServer {
    /// Create a service over a simulator handle.
    pub fn new(simulator: Arc<Simulator>) -> Self {
        Self { simulator }
    }
}

impl tokio_modbus::server::Service for SimulatorModbusServer {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    /// Process a Modbus request and provide a response
    ///
    /// This method handles the four read function codes (0x01-0x04). Any
    /// other function code, including all writes, returns an IllegalFunction
    /// exception.
    fn call(&self, req: Self::Request) -> Self::Future {
        debug!("Received Modbus request: {:?}", req);

        let bank = self.simulator.bank();

        let res = match req {
            Request::ReadCoils(addr, cnt) => {
                debug!("Reading {} coils starting from address {}", cnt, addr);
                bank.read_bits(RegisterClass::Coils, addr, cnt)
                    .map(Response::ReadCoils)
                    .map_err(to_exception)
            }
            Request::ReadDiscreteInputs(addr, cnt) => {
                debug!(
                    "Reading {} discrete inputs starting from address {}",
                    cnt, addr
                );
                bank.read_bits(RegisterClass::DiscreteInputs, addr, cnt)
                    .map(Response::ReadDiscreteInputs)
                    .map_err(to_exception)
            }
            Request::ReadHoldingRegisters(addr, cnt) => {
                debug!(
                    "Reading {} holding registers starting from address {}",
                    cnt, addr
                );
                bank.read_words(RegisterClass::HoldingRegisters, addr, cnt)
                    .map(Response::ReadHoldingRegisters)
                    .map_err(to_exception)
            }
            Request::ReadInputRegisters(addr, cnt) => {
                debug!(
                    "Reading {} input registers starting from address {}",
                    cnt, addr
                );
                bank.read_words(RegisterClass::InputRegisters, addr, cnt)
                    .map(Response::ReadInputRegisters)
                    .map_err(to_exception)
            }
            _ => {
                error!(
                    "Exception::IllegalFunction - write or unimplemented function code in request: {req:?}"
                );
                Err(ExceptionCode::IllegalFunction)
            }
        };

        // Log the result
        if let Err(e) = &res {
            error!("Modbus request error: {:?}", e);
        }

        future::ready(res)
    }
}

/// Translate a simulator read error into the protocol exception code.
fn to_exception(err: SimulatorError) -> ExceptionCode {
    match err {
        SimulatorError::OutOfRange { .. } => {
            error!("Exception::IllegalDataAddress - {err}");
            ExceptionCode::IllegalDataAddress
        }
        SimulatorError::Validation(_) => {
            error!("Exception::IllegalDataValue - {err}");
            ExceptionCode::IllegalDataValue
        }
    }
}
