//! Minimal DER encoder for RSA SubjectPublicKeyInfo
//!
//! Produces the exact byte layout external verifiers expect:
//!
//! ```text
//! SEQUENCE {
//!     SEQUENCE { OID 1.2.840.113549.1.1.1, NULL }
//!     BIT STRING { SEQUENCE { INTEGER modulus, INTEGER exponent } }
//! }
//! ```
//!
//! Everything here is a pure function of its input.

use base64::{engine::general_purpose::STANDARD, Engine};

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_NULL: u8 = 0x05;
const TAG_OBJECT_IDENTIFIER: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

/// rsaEncryption, 1.2.840.113549.1.1.1
const RSA_ENCRYPTION_OID: [u8; 9] = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];

/// Width of a PEM body line
const PEM_LINE_WIDTH: usize = 64;

/// Append a DER length in short form (< 128) or long form
pub fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }

    let bytes = len.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    let significant = &bytes[first..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

/// Encode a tag-length-value triple
pub fn encode_tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(contents.len() + 6);
    out.push(tag);
    encode_length(contents.len(), &mut out);
    out.extend_from_slice(contents);
    out
}

/// Encode a big-endian magnitude as a non-negative INTEGER
///
/// Leading zero bytes of the input are dropped; a single 0x00 is prepended
/// when the high bit of the first remaining byte is set.
pub fn encode_unsigned_integer(magnitude: &[u8]) -> Vec<u8> {
    let first = magnitude.iter().position(|b| *b != 0);
    let trimmed = match first {
        Some(index) => &magnitude[index..],
        None => &[0u8][..],
    };

    let mut contents = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        contents.push(0x00);
    }
    contents.extend_from_slice(trimmed);
    encode_tlv(TAG_INTEGER, &contents)
}

/// Encode a SEQUENCE from already encoded elements
pub fn encode_sequence(elements: &[&[u8]]) -> Vec<u8> {
    let contents: Vec<u8> = elements.iter().flat_map(|e| e.iter().copied()).collect();
    encode_tlv(TAG_SEQUENCE, &contents)
}

/// Encode a BIT STRING with zero unused bits
pub fn encode_bit_string(contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(contents.len() + 1);
    body.push(0x00);
    body.extend_from_slice(contents);
    encode_tlv(TAG_BIT_STRING, &body)
}

/// DER SubjectPublicKeyInfo for an RSA public key
pub fn rsa_subject_public_key_info(modulus: &[u8], exponent: &[u8]) -> Vec<u8> {
    let algorithm = encode_sequence(&[
        encode_tlv(TAG_OBJECT_IDENTIFIER, &RSA_ENCRYPTION_OID).as_slice(),
        encode_tlv(TAG_NULL, &[]).as_slice(),
    ]);
    let rsa_public_key = encode_sequence(&[
        encode_unsigned_integer(modulus).as_slice(),
        encode_unsigned_integer(exponent).as_slice(),
    ]);
    encode_sequence(&[algorithm.as_slice(), encode_bit_string(&rsa_public_key).as_slice()])
}

/// Wrap DER bytes in PEM armor with 64 character lines
pub fn pem_armor(label: &str, der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    pem.push_str("-----BEGIN ");
    pem.push_str(label);
    pem.push_str("-----\n");
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        // base64 output is ASCII
        pem.push_str(std::str::from_utf8(line).unwrap_or_default());
        pem.push('\n');
    }
    pem.push_str("-----END ");
    pem.push_str(label);
    pem.push_str("-----\n");
    pem
}

/// PEM `PUBLIC KEY` block for an RSA public key
pub fn rsa_public_key_pem(modulus: &[u8], exponent: &[u8]) -> String {
    pem_armor("PUBLIC KEY", &rsa_subject_public_key_info(modulus, exponent))
}
