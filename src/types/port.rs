//! Port descriptors: the declared I/O interface of a compiled program.

use serde::{Deserialize, Serialize};

use crate::error::DataportError;
use crate::types::{parse_signature, ElementType, Shape};

/// Whether a port feeds the computation or drains it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

/// One named, typed port of the compiled program's interface. Created once
/// from the declared interface and immutable for the run's lifetime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PortDescriptor {
    pub name: String,
    pub direction: Direction,
    pub element: ElementType,
    pub shape: Shape,
}

impl PortDescriptor {
    pub fn new(
        name: impl Into<String>,
        direction: Direction,
        element: ElementType,
        shape: Shape,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            element,
            shape,
        }
    }

    /// Builds a descriptor from a signature string, e.g.
    /// `PortDescriptor::parse("x", Direction::Input, "[~]int")`.
    pub fn parse(
        name: impl Into<String>,
        direction: Direction,
        signature: &str,
    ) -> Result<Self, DataportError> {
        let (element, shape) = parse_signature(signature)?;
        Ok(Self::new(name, direction, element, shape))
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    pub fn is_stream(&self) -> bool {
        self.shape.is_stream()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor() {
        let port = PortDescriptor::parse("x", Direction::Input, "[~]int").unwrap();
        assert_eq!(port.name, "x");
        assert!(port.is_input());
        assert!(port.is_stream());
        assert_eq!(port.element, ElementType::Int);
    }
}
