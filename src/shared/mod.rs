// src/shared/mod.rs

// Declara o submódulo com as structs compartilhadas entre os módulos
pub mod shared_structs;
