/*!
# DXL Analyzer Module

Token-level analysis on top of the parser: the per-file context
classifier and the corpus-wide function tables.
*/

pub mod classifier;
pub mod corpus;
pub mod functions;

pub use classifier::{
    callee_name, classify, AnnotatedToken, Classification, Classifier, ClassifierState,
    IncludeDirective, IncludeTable, LoopScope, Occurrence, SemanticTag,
};
pub use corpus::{ContentIndex, CorpusTables, FilenameIndex};
pub use functions::{FunctionRecord, FunctionTable, SourceSite};
