use rand::Rng;
use time::OffsetDateTime;

/// Alphabet for the code suffix; drops easily-confused characters (0/O, 1/I/L).
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 4;

/// Generates a print code: `PRNT` + unix seconds + a short random suffix so
/// codes minted within the same second still differ. Statistical uniqueness is
/// enough here; the storage primary key catches the residual collision and the
/// store retries generation.
#[must_use]
pub fn generate(now: OffsetDateTime) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect();
    format!("PRNT{}-{}", now.unix_timestamp(), suffix)
}
