//! Type mapping: native vocabulary, facets, user-defined types and JSON shapes.

pub mod facets;
pub mod mapper;
pub mod resolver;
pub mod structured;
pub mod vocabulary;

pub use facets::{NumericFacetExtractor, NumericFacets, RawFacets};
pub use mapper::{ColumnInput, MappedType, TypeMapper};
pub use resolver::{Resolution, UserDefinedTypeResolver};
pub use structured::{Shape, ShapeSynthesizer, StructuredType, TypeDefinition};
pub use vocabulary::{
    Confidence, HostType, NativeType, OrmScalar, OrmType, TypeFamily, TypeLookup, TypeVocabulary,
};
