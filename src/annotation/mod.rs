pub mod builder;
pub mod io;
pub mod regions;

pub use builder::AnnotationBuilder;
pub use io::{AlignmentReader, AlignmentRecord, AnnotationReader, AnnotationRecord};
pub use regions::{Annotation, ExtendedAnnotation, ExtendedRegions, TranscriptRegions};
