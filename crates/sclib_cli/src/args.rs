//! CLI args

use clap::{Parser, Subcommand, ValueEnum};
use sclib::ScBigInt;

/// Inspect contract wire encodings
#[derive(Parser)]
#[clap(version, about)]
pub(crate) struct CliArgs {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Encode a decimal integer as a varint
    Encode {
        /// Use the signed encoding
        #[clap(short, long)]
        signed: bool,

        /// The integer to encode
        #[clap(allow_hyphen_values = true)]
        value: String,
    },

    /// Decode a hex varint
    Decode {
        /// Use the signed encoding
        #[clap(short, long)]
        signed: bool,

        /// Maximum width of the value in bits
        #[clap(short, long)]
        #[clap(default_value_t = sclib::defaults::DEFAULT_VARINT_BITS)]
        bits: u32,

        /// Encoded bytes, with or without a 0x prefix
        hex: String,
    },

    /// Big integer arithmetic on decimal operands
    Bigint {
        lhs: ScBigInt,

        #[clap(value_enum)]
        op: BigIntOp,

        rhs: ScBigInt,
    },

    /// Decode a serialized dictionary
    Dict {
        /// Encoded bytes, with or without a 0x prefix
        hex: String,
    },

    /// Decode a serialized asset bundle
    Assets {
        /// Encoded bytes, with or without a 0x prefix
        hex: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum BigIntOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Cmp,
}
