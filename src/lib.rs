//! VectorChord / pgvector SQL dialect
//!
//! A base PostgreSQL grammar with named extension points, dialect modules
//! that layer rules over those points, and a chain of decorated type
//! resolvers that type the constructs the layers introduce.

pub mod compiler;
pub mod config;
pub mod error;
pub mod extensions;
pub mod grammar;
pub mod parser;
pub mod resolver;
pub mod types;
pub mod vector;

pub use compiler::{CompiledUnit, Compiler};
pub use config::Config;
pub use error::{Error, Result};
pub use extensions::DialectModule;
pub use grammar::{ExtensionPoint, Grammar, Production};
pub use resolver::{PostgreSqlTypeResolver, ResolveContext, TypeResolver};
pub use types::{DialectType, IntermediateType, PostgreSqlType, PrimitiveType};
pub use vector::{VectorChordModule, VectorChordSqlType};
