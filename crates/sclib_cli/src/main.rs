mod args;

use args::{BigIntOp, CliArgs, Command};
use clap::Parser;
use sclib::{
    defaults, types::hex_encode, ByteViewer, ByteWriter, Error, ScAssets, ScBigInt, ScDict,
    ScResult, WireType,
};

fn main() -> ScResult<()> {
    match std::env::var("RUST_LOG") {
        Ok(_) => (),
        Err(_) => std::env::set_var("RUST_LOG", defaults::DEFAULT_LOG_FILTER),
    }

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_default())
        .init();

    let args = CliArgs::parse();
    log::debug!("running {:?}", args.command);

    for line in run(args.command)? {
        println!("{}", line);
    }

    Ok(())
}

/// Execute a command, returning the lines to print
fn run(command: Command) -> ScResult<Vec<String>> {
    match command {
        Command::Encode { signed, value } => encode_varint(signed, &value),
        Command::Decode { signed, bits, hex } => decode_varint(signed, bits, &parse_hex(&hex)?),
        Command::Bigint { lhs, op, rhs } => Ok(vec![big_int_op(&lhs, op, &rhs)?]),
        Command::Dict { hex } => describe_dict(&parse_hex(&hex)?),
        Command::Assets { hex } => describe_assets(&parse_hex(&hex)?),
    }
}

fn parse_hex(s: &str) -> ScResult<Vec<u8>> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|e| Error::InvalidValue(format!("hex input {:?}: {}", s, e)))
}

fn encode_varint(signed: bool, value: &str) -> ScResult<Vec<String>> {
    let mut enc = ByteWriter::new();
    match signed {
        true => enc.vli_encode(i64::from_text(value)?),
        false => enc.vlu_encode(u64::from_text(value)?),
    };
    Ok(vec![hex_encode(enc.buf())])
}

fn decode_varint(signed: bool, bits: u32, buf: &[u8]) -> ScResult<Vec<String>> {
    let mut dec = ByteViewer::from_slice(buf);
    let value = match signed {
        true => dec.vli_decode(bits)?.to_string(),
        false => dec.vlu_decode(bits)?.to_string(),
    };
    dec.close()?;
    Ok(vec![value])
}

fn big_int_op(lhs: &ScBigInt, op: BigIntOp, rhs: &ScBigInt) -> ScResult<String> {
    let shift = || -> ScResult<u32> {
        let shift = rhs.to_u64()?;
        u32::try_from(shift).map_err(|_| Error::Overflow { bits: u32::BITS })
    };

    let result = match op {
        BigIntOp::Add => lhs.add(rhs),
        BigIntOp::Sub => lhs.sub(rhs)?,
        BigIntOp::Mul => lhs.mul(rhs),
        BigIntOp::Div => lhs.div(rhs)?,
        BigIntOp::Mod => lhs.modulo(rhs)?,
        BigIntOp::Shl => lhs.shl(shift()?),
        BigIntOp::Shr => lhs.shr(shift()?),
        BigIntOp::Cmp => return Ok(lhs.compare(rhs).to_string()),
    };
    Ok(result.to_text())
}

fn describe_dict(buf: &[u8]) -> ScResult<Vec<String>> {
    let dict = ScDict::from_bytes(buf)?;

    let mut lines = vec![format!("{} entries", dict.len())];
    for (key, value) in dict.entries() {
        let key = match std::str::from_utf8(key) {
            Ok(text) if !text.is_empty() && text.chars().all(|c| c.is_ascii_graphic()) => {
                text.to_string()
            }
            _ => hex_encode(key),
        };
        lines.push(format!("{}: {}", key, hex_encode(value)));
    }
    Ok(lines)
}

fn describe_assets(buf: &[u8]) -> ScResult<Vec<String>> {
    let assets = ScAssets::from_bytes(buf)?;

    let mut lines = vec![format!("base tokens: {}", assets.base_tokens())];
    for token_id in assets.token_ids() {
        lines.push(format!("token {}: {}", token_id, assets.balance(&token_id)));
    }
    for nft_id in assets.nft_ids() {
        lines.push(format!("nft {}", nft_id));
    }
    if assets.is_empty() {
        lines.push("empty".to_string());
    }
    Ok(lines)
}
