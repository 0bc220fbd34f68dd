use std::collections::BTreeMap;

use crate::parser::{ExtractedItem, Row};

/// A flat output record: `(brand, item, ...row)`.
pub type Record = Vec<String>;

/// Tabular output channels. Each maps to one CSV file per brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Specification,
    Analog,
    Subassembly,
    Couple,
    Usage,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Specification,
        Channel::Analog,
        Channel::Subassembly,
        Channel::Couple,
        Channel::Usage,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Channel::Specification => "specification.csv",
            Channel::Analog => "crosses.csv",
            Channel::Subassembly => "subassembly.csv",
            Channel::Couple => "couple.csv",
            Channel::Usage => "usage.csv",
        }
    }

    pub fn header(self) -> &'static [&'static str] {
        match self {
            Channel::Specification => &["Brand", "Part Number", "Parameter", "Value"],
            Channel::Analog => &["Brand", "Part Number", "OWNER", "NUMBER"],
            Channel::Subassembly => &["Brand", "Part Number", "Brand", "Part", "Type"],
            Channel::Couple => &["Brand", "Part Number", "Number"],
            Channel::Usage => &["Brand", "Part Number", "Brand", "Model", "Year", "Engine", "Description"],
        }
    }

    /// Field count of every record on this channel.
    pub fn width(self) -> usize {
        self.header().len()
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Specification => "specification",
            Channel::Analog => "analog",
            Channel::Subassembly => "subassembly",
            Channel::Couple => "couple",
            Channel::Usage => "usage",
        }
    }
}

/// Image to download for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTask {
    pub url: String,
    /// `{brand}/img/{item}.{ext}`
    pub file_name: String,
    /// `{item}.{ext}`
    pub local_name: String,
}

/// One item, denormalized and split per channel.
#[derive(Debug, Clone)]
pub struct RoutedItem {
    pub brand: String,
    pub item: String,
    pub records: BTreeMap<Channel, Vec<Record>>,
    pub image: Option<ImageTask>,
}

impl RoutedItem {
    pub fn records(&self, channel: Channel) -> &[Record] {
        self.records.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn route(extracted: ExtractedItem, brand: &str, item: &str) -> RoutedItem {
    let ExtractedItem {
        image_url,
        specification,
        analogs,
        subassemblies,
        couplings,
        usages,
    } = extracted;

    let mut records = BTreeMap::new();
    for (channel, rows) in [
        (Channel::Specification, specification),
        (Channel::Analog, analogs),
        (Channel::Subassembly, subassemblies),
        (Channel::Couple, couplings),
        (Channel::Usage, usages),
    ] {
        let prefixed: Vec<Record> = rows
            .into_iter()
            .map(|row| to_record(channel, brand, item, row))
            .collect();
        records.insert(channel, prefixed);
    }

    RoutedItem {
        brand: brand.to_string(),
        item: item.to_string(),
        records,
        image: image_url.and_then(|url| image_task(&url, brand, item)),
    }
}

/// Prefix a row with (brand, item) and fit it to the channel's width:
/// missing trailing fields become empty, surplus fields are dropped.
fn to_record(channel: Channel, brand: &str, item: &str, row: Row) -> Record {
    let mut record = Vec::with_capacity(channel.width());
    record.push(brand.to_string());
    record.push(item.to_string());
    record.extend(row);
    record.resize(channel.width(), String::new());
    record
}

/// `None` when the URL has no usable extension.
pub fn image_task(url: &str, brand: &str, item: &str) -> Option<ImageTask> {
    let (_, ext) = url.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    let local_name = format!("{}.{}", item, ext);
    Some(ImageTask {
        url: url.to_string(),
        file_name: format!("{}/img/{}", brand.to_lowercase(), local_name),
        local_name,
    })
}
