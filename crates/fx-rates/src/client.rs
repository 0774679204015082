//! Bank rate feed client

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::error::{RatesError, Result};
use crate::models::{Entry, ExchangeRateTable};

/// Anything that can produce a fresh exchange rate table.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch, validate and sort the current table.
    async fn fetch(&self) -> Result<ExchangeRateTable>;
}

/// HTTP client for the bank's XML rate endpoint
#[derive(Clone)]
pub struct RateClient {
    client: Client,
    url: String,
}

impl RateClient {
    /// Create a new rate client
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RatesError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateSource for RateClient {
    async fn fetch(&self) -> Result<ExchangeRateTable> {
        debug!("Fetching exchange rates from {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Rate feed error: {} - {}", status, body);
            return Err(RatesError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let mut table = parse_table(&body)?;
        table.fetched_at = Some(Utc::now());

        info!(
            "Fetched {} exchange rates published {}",
            table.len(),
            table.date_time
        );
        Ok(table)
    }
}

#[derive(Clone, Copy)]
enum TextField {
    DateTime,
    Source,
}

/// Decode the bank XML document into a sorted table.
///
/// Entries that fail validation are dropped with a warning. A document
/// without any usable `Exrate` element is an error.
pub fn parse_table(xml: &str) -> Result<ExchangeRateTable> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut date_time = String::new();
    let mut source = String::new();
    let mut entries = Vec::new();
    let mut current: Option<TextField> = None;
    let mut saw_element = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                saw_element = true;
                match e.name().as_ref() {
                    b"DateTime" => current = Some(TextField::DateTime),
                    b"Source" => current = Some(TextField::Source),
                    b"Exrate" => push_entry(e, &mut entries)?,
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                saw_element = true;
                if e.name().as_ref() == b"Exrate" {
                    push_entry(e, &mut entries)?;
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Text(ref e)) => {
                if let Some(field) = current {
                    let text = e.unescape()?;
                    match field {
                        TextField::DateTime => date_time.push_str(&text),
                        TextField::Source => source.push_str(&text),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Malformed rate feed at position {}", reader.error_position());
                return Err(e.into());
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_element {
        return Err(RatesError::XmlParseError("document has no root element".to_string()));
    }
    if entries.is_empty() {
        return Err(RatesError::XmlParseError("no Exrate entries found".to_string()));
    }

    Ok(ExchangeRateTable::new(date_time, source, entries))
}

fn push_entry(element: &BytesStart<'_>, entries: &mut Vec<Entry>) -> Result<()> {
    match read_entry(element) {
        Ok(entry) => entries.push(entry),
        Err(RatesError::InvalidEntry(reason)) => {
            warn!("Skipping rate entry: {}", reason);
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn read_entry(element: &BytesStart<'_>) -> Result<Entry> {
    let mut code = None;
    let mut name = None;
    let mut buy = None;
    let mut sell = None;
    let mut transfer = None;

    for attr in element.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.trim().to_string();

        match attr.key.as_ref() {
            b"CurrencyCode" => code = Some(value),
            b"CurrencyName" => name = Some(value),
            b"Buy" => buy = Some(value),
            b"Sell" => sell = Some(value),
            b"Transfer" => transfer = Some(value),
            _ => {}
        }
    }

    let missing = |attr: &str| RatesError::InvalidEntry(format!("missing {} attribute", attr));

    let entry = Entry {
        currency_code: code.ok_or_else(|| missing("CurrencyCode"))?,
        currency_name: name.ok_or_else(|| missing("CurrencyName"))?,
        buy: buy.ok_or_else(|| missing("Buy"))?,
        sell: sell.ok_or_else(|| missing("Sell"))?,
        transfer: transfer.ok_or_else(|| missing("Transfer"))?,
    };
    entry.validate()?;

    Ok(entry)
}
