// ---------------------------------------------------------------------------
// envelope – text header with magic, format version and checksum
// ---------------------------------------------------------------------------
//
// Layout (pipe separated, all ASCII):
//   IDLESAVE|<format version>|<xxHash32 of payload, 8 lowercase hex>|<payload>
//
// On save: compact payload -> prepend header (checksum of payload)
// On load: check magic -> parse version -> verify checksum -> strip header
// Legacy: text without the magic is handed back untouched (headerless save)

use xxhash_rust::xxh32::xxh32;

/// Magic prefix identifying an enveloped snapshot.
pub const MAGIC: &str = "IDLESAVE";

const SEPARATOR: char = '|';

/// Current envelope layout version. Distinct from the snapshot format
/// version, which tracks the payload schema.
pub const ENVELOPE_VERSION: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub version: u32,
    pub checksum: u32,
}

pub fn checksum(payload: &str) -> u32 {
    xxh32(payload.as_bytes(), XXHASH_SEED)
}

/// Wrap a payload: `IDLESAVE|1|<checksum>|<payload>`.
pub fn wrap_with_header(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len() + 24);
    out.push_str(MAGIC);
    out.push(SEPARATOR);
    out.push_str(&ENVELOPE_VERSION.to_string());
    out.push(SEPARATOR);
    out.push_str(&format!("{:08x}", checksum(payload)));
    out.push(SEPARATOR);
    out.push_str(payload);
    out
}

/// Result of unwrapping stored text.
#[derive(Debug, PartialEq, Eq)]
pub enum UnwrapResult<'a> {
    /// Valid header; the payload follows.
    WithHeader {
        header: EnvelopeHeader,
        payload: &'a str,
    },
    /// No magic prefix: the whole text is the payload.
    Legacy(&'a str),
}

/// Parse and validate the envelope header.
///
/// # Errors
///
/// Returns an error if the magic is present but the header is truncated or
/// malformed, comes from a newer envelope version, or the checksum does not
/// match the payload.
pub fn unwrap_header(text: &str) -> Result<UnwrapResult<'_>, String> {
    let Some(rest) = text.strip_prefix(MAGIC) else {
        return Ok(UnwrapResult::Legacy(text));
    };

    let mut parts = rest.splitn(4, SEPARATOR);
    // `rest` starts with the separator, so the first part is empty.
    let (Some(""), Some(version), Some(sum), Some(payload)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!(
            "Save text has {MAGIC} magic but a truncated header ({} bytes)",
            text.len()
        ));
    };

    let version: u32 = version
        .parse()
        .map_err(|_| format!("Save header has an invalid version field: {version:?}"))?;
    if version > ENVELOPE_VERSION {
        return Err(format!(
            "Save uses envelope version {version}, but this build only supports \
             up to version {ENVELOPE_VERSION}"
        ));
    }

    let expected = u32::from_str_radix(sum, 16)
        .ok()
        .filter(|_| sum.len() == 8)
        .ok_or_else(|| format!("Save header has an invalid checksum field: {sum:?}"))?;

    let computed = checksum(payload);
    if computed != expected {
        return Err(format!(
            "Save is corrupted: checksum mismatch (expected {expected:08x}, got {computed:08x})"
        ));
    }

    Ok(UnwrapResult::WithHeader {
        header: EnvelopeHeader {
            version,
            checksum: expected,
        },
        payload,
    })
}
