pub mod bloom_pass;
pub mod mesh_pass;
pub mod particle_pass;
