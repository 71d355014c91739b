// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Loading of precomputed road networks.
//!
//! Networks are stored as XML documents, with nodes positioned in a projected frame
//! and edges carrying `length` and `PM25_expo` attributes:
//!
//! ```xml
//! <network>
//!   <node id="1" x="180000.0" y="2500000.0"/>
//!   <node id="2" x="180035.2" y="2500000.0"/>
//!   <edge from="1" to="2">
//!     <attr k="length" v="35.2"/>
//!     <attr_dict>
//!       <attr k="PM25_expo" v="812.4"/>
//!     </attr_dict>
//!   </edge>
//! </network>
//! ```
//!
//! Attributes may be nested in an `attr_dict` element; they are flattened into
//! direct edge attributes by [RawNetwork::into_graph].

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::{Graph, TransverseMercator};

mod error;
mod model;
mod xml;

pub use error::LoadError;
pub use model::{Feature, RawEdge, RawNetwork, RawNode};

/// Format of the input network file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    #[default]
    Unknown,

    /// Force uncompressed XML
    Xml,

    /// Force XML with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force XML with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format of a network file from its first bytes.
    fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Self::XmlGz
        } else if head.starts_with(b"BZh") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// Additional controls for loading a road network.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,

    /// Projected frame of the node positions.
    pub projection: TransverseMercator,
}

fn read_features<I>(features: I) -> Result<RawNetwork, LoadError>
where
    I: Iterator<Item = Result<Feature, quick_xml::Error>>,
{
    let mut n = RawNetwork::default();
    for f in features {
        n.add_feature(f?);
    }
    Ok(n)
}

/// Parse a network from a reader.
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn read_from_io<R: io::Read>(options: &Options, reader: R) -> Result<RawNetwork, LoadError> {
    let mut b = io::BufReader::new(reader);
    let file_format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        known => known,
    };

    match file_format {
        FileFormat::Unknown | FileFormat::Xml => read_features(xml::Reader::from_io(b)),

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            read_features(xml::Reader::from_io(io::BufReader::new(d)))
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            read_features(xml::Reader::from_io(io::BufReader::new(d)))
        }
    }
}

/// Parse a network from a file at the provided path.
pub fn read_from_file<P: AsRef<Path>>(options: &Options, path: P) -> Result<RawNetwork, LoadError> {
    let f = File::open(path)?;
    read_from_io(options, f)
}

/// Parse a network from a static buffer.
pub fn read_from_buffer(options: &Options, data: &[u8]) -> Result<RawNetwork, LoadError> {
    let file_format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        known => known,
    };

    if file_format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        read_features(xml::Reader::from_buffer(data))
    } else {
        read_from_io(options, io::Cursor::new(data))
    }
}

/// Loads a network file and normalizes it into a [Graph].
pub fn load_graph<P: AsRef<Path>>(options: &Options, path: P) -> Result<Graph, LoadError> {
    let raw = read_from_file(options, path.as_ref())?;
    log::info!(
        "read {}: {} nodes, {} edges",
        path.as_ref().display(),
        raw.nodes.len(),
        raw.edges.len()
    );
    raw.into_graph(&options.projection)
}
