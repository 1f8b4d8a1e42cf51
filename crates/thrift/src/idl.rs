//! Embedded Thrift IDL.
//!
//! The schema of `TApplicationException` is compiled into the crate so tools
//! can inspect it without reading files at runtime.

/// Static description of a Thrift file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThriftModule {
    /// Module name.
    pub name: &'static str,
    /// Package the module was generated into.
    pub package: &'static str,
    /// Path of the file relative to the IDL root.
    pub file_path: &'static str,
    /// Hex-encoded SHA-1 of [`raw`](Self::raw).
    pub sha1: &'static str,
    /// The IDL source.
    pub raw: &'static str,
}

/// The internal module declaring `ExceptionType` and `TApplicationException`.
pub static THRIFT_MODULE: ThriftModule = ThriftModule {
    name: "internal",
    package: "proven_thrift::internal",
    file_path: "internal.thrift",
    sha1: "88105bcd404d4aee06542af9452f7cf76647ae98",
    raw: include_str!("../idl/internal.thrift"),
};
