//! secp256k1 public-key recovery and SHA-256.
//!
//! Signatures are 65 bytes, `r || s || v`, with `v` either the raw
//! recovery id (0 or 1) or the Ethereum-style 27/28. Public keys are
//! 33-byte SEC1 compressed points.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::gas::{RECOVER_KEY, SHA256_BASE, SHA256_BYTE};
use crate::types::ValueType::I32;
use crate::types::{Digest, Value};

pub const SIGNATURE_LEN: usize = 65;
pub const PUBLIC_KEY_LEN: usize = 33;

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::env("assert_recover_key", &[I32, I32, I32, I32, I32], None, assert_recover_key),
    Intrinsic::env("recover_key", &[I32, I32, I32, I32, I32], Some(I32), recover_key),
    Intrinsic::env("assert_sha256", &[I32, I32, I32], None, assert_sha256),
    Intrinsic::env("sha256", &[I32, I32, I32], None, sha256),
];

/// Recover the compressed public key that produced `signature` over the
/// 32-byte `digest`.
pub fn recover(digest: &[u8; 32], signature: &[u8]) -> Result<[u8; PUBLIC_KEY_LEN]> {
    if signature.len() != SIGNATURE_LEN {
        return Err(Error::crypto(format!(
            "signature must be {SIGNATURE_LEN} bytes, got {}",
            signature.len()
        )));
    }
    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| Error::crypto(format!("malformed signature: {e}")))?;
    let v = match signature[64] {
        v @ (27 | 28) => v - 27,
        v => v,
    };
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| Error::crypto(format!("invalid recovery id {v}")))?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|e| Error::crypto(format!("key recovery failed: {e}")))?;

    let point = key.as_affine().to_encoded_point(true);
    point
        .as_bytes()
        .try_into()
        .map_err(|_| Error::crypto("unexpected public key encoding"))
}

// (digest, sig, sig_len, pub, pub_len)
fn recover_from_memory(ctx: &mut Context<'_>, a: &Args<'_>) -> Result<[u8; PUBLIC_KEY_LEN]> {
    let digest = ctx.memory.read_array::<32>(a.u32(0)?)?;
    let sig = ctx.memory.slice(a.u32(1)?, a.u32(2)?)?;
    recover(&digest, sig)
}

fn assert_recover_key(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(RECOVER_KEY)?;
    let recovered = recover_from_memory(ctx, &a)?;
    let expected = ctx.memory.slice(a.u32(3)?, a.u32(4)?)?;
    if expected != recovered.as_slice() {
        return Err(Error::crypto("public key does not match the recovered key"));
    }
    Ok(None)
}

fn recover_key(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(RECOVER_KEY)?;
    let recovered = recover_from_memory(ctx, &a)?;
    let out_len = a.u32(4)?;
    if (out_len as usize) < PUBLIC_KEY_LEN {
        return Err(Error::crypto(format!(
            "public key buffer of {out_len} bytes is too small"
        )));
    }
    ctx.memory.write(a.u32(3)?, &recovered)?;
    Ok(Some(Value::I32(PUBLIC_KEY_LEN as i32)))
}

fn hash_from_memory(ctx: &mut Context<'_>, a: &Args<'_>) -> Result<Digest> {
    let len = a.u32(1)?;
    ctx.use_gas(SHA256_BASE + len as u64 * SHA256_BYTE)?;
    let data = ctx.memory.slice(a.u32(0)?, len)?;
    Ok(ctx.host.sha256(data))
}

// (data, len, hash)
fn assert_sha256(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    let hash = hash_from_memory(ctx, &a)?;
    let expected = ctx.memory.read_array::<32>(a.u32(2)?)?;
    if hash.0 != expected {
        return Err(Error::crypto("hash mismatch"));
    }
    Ok(None)
}

fn sha256(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    let hash = hash_from_memory(ctx, &a)?;
    ctx.memory.write(a.u32(2)?, hash.as_bytes())?;
    Ok(None)
}
