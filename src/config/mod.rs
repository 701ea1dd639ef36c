pub mod backend;
pub mod persona;

pub use backend::{ BackendConfig, BackendKind, SamplingConfig };
pub use persona::{ Persona, PersonaError };
