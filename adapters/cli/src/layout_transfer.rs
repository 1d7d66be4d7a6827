use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use turngrid_core::{ElementBlueprint, GridConfiguration};

const LAYOUT_DOMAIN: &str = "grid";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "grid:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Grid geometry and element placements that can be shared as a single line of text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct MapLayout {
    /// Geometry of the grid, including its dimensions.
    pub grid: GridConfiguration,
    /// Elements placed on the grid, in registration order.
    pub elements: Vec<ElementBlueprint>,
}

impl MapLayout {
    /// Encodes the layout into a single-line string such as `grid:v1:10x8:<payload>`.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let payload = SerializableLayout {
            cell_width: self.grid.cell_width,
            cell_height: self.grid.cell_height,
            offset_left: self.grid.offset_left,
            offset_top: self.grid.offset_top,
            elements: self.elements.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{LAYOUT_HEADER}:{}x{}:{encoded}",
            self.grid.width, self.grid.height
        ))
    }

    /// Decodes a layout from its single-line representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts
            .next()
            .ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (width, height) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializableLayout =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            grid: GridConfiguration {
                width,
                height,
                cell_width: decoded.cell_width,
                cell_height: decoded.cell_height,
                offset_left: decoded.offset_left,
                offset_top: decoded.offset_top,
            },
            elements: decoded.elements,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct SerializableLayout {
    cell_width: f32,
    cell_height: f32,
    offset_left: f32,
    offset_top: f32,
    elements: Vec<ElementBlueprint>,
}

/// Errors that can occur while encoding or decoding layout strings.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The prefix named another format.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version is not understood by this build.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be converted to or from JSON.
    #[error("could not process layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}
