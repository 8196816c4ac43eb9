pub use kusari_internal::*;
