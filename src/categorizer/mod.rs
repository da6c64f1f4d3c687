//! Opcode categorization.
//!
//! Maps EVM opcode mnemonics to semantic categories for gas attribution.
//! Categorization is a total function: matching is case-insensitive and
//! unknown mnemonics fall through to `Other`, never an error.

use serde::{Deserialize, Serialize};

/// Semantic category of an EVM opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpcodeCategory {
    /// Arithmetic, comparison, bitwise, and stack-manipulation ops
    Computation,
    /// Persistent and transient storage access
    Storage,
    /// Memory and copy operations
    Memory,
    /// Jumps, halting, and program-counter ops
    ControlFlow,
    /// Calls, creates, logs, and environment queries
    System,
    /// Hashing
    Crypto,
    /// Anything unrecognized
    Other,
}

impl OpcodeCategory {
    /// All categories, in display order
    pub const ALL: [OpcodeCategory; 7] = [
        OpcodeCategory::Computation,
        OpcodeCategory::Storage,
        OpcodeCategory::Memory,
        OpcodeCategory::ControlFlow,
        OpcodeCategory::System,
        OpcodeCategory::Crypto,
        OpcodeCategory::Other,
    ];

    /// Human-readable label used in breakdowns and summaries
    pub fn label(&self) -> &'static str {
        match self {
            OpcodeCategory::Computation => "Computation",
            OpcodeCategory::Storage => "Storage",
            OpcodeCategory::Memory => "Memory",
            OpcodeCategory::ControlFlow => "Control Flow",
            OpcodeCategory::System => "System",
            OpcodeCategory::Crypto => "Crypto",
            OpcodeCategory::Other => "Other",
        }
    }

    /// Chart color assigned to this category (hex), consumed by the
    /// presentation layer
    pub fn chart_color(&self) -> &'static str {
        match self {
            OpcodeCategory::Computation => "#60a5fa",
            OpcodeCategory::Storage => "#f87171",
            OpcodeCategory::Memory => "#34d399",
            OpcodeCategory::ControlFlow => "#fbbf24",
            OpcodeCategory::System => "#a78bfa",
            OpcodeCategory::Crypto => "#f472b6",
            OpcodeCategory::Other => "#9ca3af",
        }
    }
}

impl std::fmt::Display for OpcodeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorize an opcode mnemonic.
///
/// **Public** - used by both aggregators
///
/// Pure and total: input is normalized to uppercase, unknown opcodes map
/// to `Other`.
pub fn categorize(opcode: &str) -> OpcodeCategory {
    let op = opcode.trim().to_ascii_uppercase();

    match op.as_str() {
        // Arithmetic / comparison / bitwise
        "ADD" | "SUB" | "MUL" | "DIV" | "SDIV" | "MOD" | "SMOD" | "ADDMOD" | "MULMOD" | "EXP"
        | "SIGNEXTEND" | "LT" | "GT" | "SLT" | "SGT" | "EQ" | "ISZERO" | "AND" | "OR" | "XOR"
        | "NOT" | "BYTE" | "SHL" | "SHR" | "SAR" | "POP" => OpcodeCategory::Computation,

        "SLOAD" | "SSTORE" | "TLOAD" | "TSTORE" => OpcodeCategory::Storage,

        "MLOAD" | "MSTORE" | "MSTORE8" | "MSIZE" | "MCOPY" | "CALLDATACOPY" | "CODECOPY"
        | "EXTCODECOPY" | "RETURNDATACOPY" => OpcodeCategory::Memory,

        "JUMP" | "JUMPI" | "JUMPDEST" | "PC" | "STOP" | "RETURN" | "REVERT" | "INVALID" => {
            OpcodeCategory::ControlFlow
        }

        "CALL" | "CALLCODE" | "DELEGATECALL" | "STATICCALL" | "CREATE" | "CREATE2"
        | "SELFDESTRUCT" | "ADDRESS" | "BALANCE" | "ORIGIN" | "CALLER" | "CALLVALUE"
        | "CALLDATALOAD" | "CALLDATASIZE" | "CODESIZE" | "GASPRICE" | "EXTCODESIZE"
        | "EXTCODEHASH" | "RETURNDATASIZE" | "BLOCKHASH" | "COINBASE" | "TIMESTAMP" | "NUMBER"
        | "DIFFICULTY" | "PREVRANDAO" | "GASLIMIT" | "CHAINID" | "SELFBALANCE" | "BASEFEE"
        | "BLOBHASH" | "BLOBBASEFEE" | "GAS" => OpcodeCategory::System,

        "KECCAK256" | "SHA3" => OpcodeCategory::Crypto,

        _ => {
            // Numbered families: LOG0..LOG4, PUSH0..PUSH32, DUP1..DUP16,
            // SWAP1..SWAP16
            if op.starts_with("LOG") {
                OpcodeCategory::System
            } else if op.starts_with("PUSH") || op.starts_with("DUP") || op.starts_with("SWAP") {
                OpcodeCategory::Computation
            } else {
                OpcodeCategory::Other
            }
        }
    }
}
