//! The interface report: a JSON description of a program's declared ports,
//! written next to the generated program and consumed by conformance
//! tooling. The runtime itself never reads it back.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::DataportError;
use crate::types::{Direction, PortDescriptor};

/// One port as listed in the report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PortReport {
    pub name: String,
    #[serde(rename = "type")]
    pub element: String,
    pub is_stream: bool,
    pub dimensions: Vec<usize>,
}

impl PortReport {
    fn from_port(port: &PortDescriptor) -> Self {
        Self {
            name: port.name.clone(),
            element: port.element.to_string(),
            is_stream: port.is_stream(),
            dimensions: port.shape.dimensions().to_vec(),
        }
    }
}

/// The whole declared interface, split by direction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InterfaceReport {
    pub inputs: Vec<PortReport>,
    pub outputs: Vec<PortReport>,
}

/// Builds the report for a declared interface.
pub fn interface_report(ports: &[PortDescriptor]) -> InterfaceReport {
    let (inputs, outputs): (Vec<&PortDescriptor>, Vec<&PortDescriptor>) =
        ports.iter().partition(|p| p.direction == Direction::Input);
    InterfaceReport {
        inputs: inputs.into_iter().map(PortReport::from_port).collect(),
        outputs: outputs.into_iter().map(PortReport::from_port).collect(),
    }
}

/// Serializes the report as JSON.
pub fn write_report<W: Write>(
    writer: W,
    ports: &[PortDescriptor],
) -> Result<(), DataportError> {
    serde_json::to_writer_pretty(writer, &interface_report(ports))?;
    Ok(())
}
