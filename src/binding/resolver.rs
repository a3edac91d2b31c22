//! The binding resolver: turns the command line's `name=spec` tokens and the
//! global defaults into one `Binding` per declared port.
//!
//! Resolution is a pure function of (config, tokens, declared ports). It
//! performs every check that does not require reading data: unknown port
//! names, literals aimed at output ports, literal token counts against
//! finite shapes, and format suffixes. Opening files and parsing literal
//! values happen later, at channel-setup time.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::binding::{Binding, Locator, LocatorKind};
use crate::codec::Format;
use crate::config::SessionConfig;
use crate::error::DataportError;
use crate::types::{Direction, PortDescriptor};

/// Resolves all bindings for a run. The returned vector follows the
/// declared port order.
pub fn resolve(
    config: &SessionConfig,
    tokens: &[String],
    ports: &[PortDescriptor],
) -> Result<Vec<Binding>, DataportError> {
    let by_name: HashMap<&str, &PortDescriptor> =
        ports.iter().map(|p| (p.name.as_str(), p)).collect();

    // Collect the per-port specification strings. A port named twice keeps
    // the last specification, like any command-line override.
    let mut specs: HashMap<&str, &str> = HashMap::new();
    for token in tokens {
        let (name, spec) = token.split_once('=').ok_or_else(|| {
            DataportError::BindingResolution(format!(
                "invalid binding '{}' (expected name=spec)",
                token
            ))
        })?;
        if !by_name.contains_key(name) {
            let mut declared: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
            declared.sort_unstable();
            return Err(DataportError::BindingResolution(format!(
                "unknown port '{}' (declared ports: {})",
                name,
                declared.join(", ")
            )));
        }
        if let Some(previous) = specs.insert(name, spec) {
            log::warn!(
                "port '{}' bound twice; '{}' replaces '{}'",
                name,
                spec,
                previous
            );
        }
    }

    let mut bindings = Vec::with_capacity(ports.len());
    for port in ports {
        let binding = match specs.get(port.name.as_str()) {
            Some(spec) => resolve_one(config, port, spec)?,
            None => default_binding(config, port),
        };
        log::debug!(
            "port '{}' bound to {:?} ({}, {:?})",
            port.name,
            binding.locator,
            binding.format,
            binding.block
        );
        bindings.push(binding);
    }

    let stdin_readers = bindings
        .iter()
        .filter(|b| b.direction == Direction::Input && b.locator == Locator::Pipe)
        .count();
    if stdin_readers > 1 {
        log::warn!(
            "{} input ports read standard input; their values interleave by read order",
            stdin_readers
        );
    }

    Ok(bindings)
}

/// Resolves one explicit `name=spec` binding against its port.
fn resolve_one(
    config: &SessionConfig,
    port: &PortDescriptor,
    spec: &str,
) -> Result<Binding, DataportError> {
    if spec.is_empty() {
        return Err(DataportError::BindingResolution(format!(
            "empty specification for port '{}'",
            port.name
        )));
    }

    match Locator::classify(spec) {
        LocatorKind::Literal => resolve_literal(config, port, spec),
        LocatorKind::Pipe | LocatorKind::File => {
            // Split an optional `:format` suffix off the locator value.
            let (value, format) = match spec.split_once(':') {
                Some((value, suffix)) => (value, Some(suffix.parse::<Format>()?)),
                None => (spec, None),
            };

            let locator = if value == "pipe" {
                Locator::Pipe
            } else {
                Locator::File(PathBuf::from(value))
            };

            Ok(Binding {
                port: port.name.clone(),
                direction: port.direction,
                locator,
                format: format.unwrap_or_else(|| config.fallback_format()),
                block: config.block,
            })
        }
    }
}

/// Resolves an inline literal value sequence.
fn resolve_literal(
    config: &SessionConfig,
    port: &PortDescriptor,
    spec: &str,
) -> Result<Binding, DataportError> {
    if port.direction == Direction::Output {
        return Err(DataportError::BindingResolution(format!(
            "literal values cannot feed output port '{}'",
            port.name
        )));
    }

    // Space- and comma-separated literals are normalized once, here; the
    // ordinary text codec parses the tokens at channel-setup time.
    let normalized = spec.replace(',', " ");
    let count = normalized.split_whitespace().count() as u64;

    if let Some(declared) = port.shape.element_count() {
        if count != declared {
            return Err(DataportError::BindingResolution(format!(
                "literal for port '{}' has {} values but the declared shape needs {}",
                port.name, count, declared
            )));
        }
    }

    Ok(Binding {
        port: port.name.clone(),
        direction: port.direction,
        locator: Locator::Literal(normalized),
        format: Format::Text,
        block: config.block,
    })
}

/// The fallback for a declared port with no matching binding: the standard
/// stream in the run's default format.
fn default_binding(config: &SessionConfig, port: &PortDescriptor) -> Binding {
    Binding {
        port: port.name.clone(),
        direction: port.direction,
        locator: Locator::Pipe,
        format: config.fallback_format(),
        block: config.block,
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
