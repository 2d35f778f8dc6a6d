pub mod cli;
pub mod commands;

pub mod core {
    pub mod allele;
    pub mod allele_map;
    pub mod alt;
    pub mod field;
    pub mod genotype;
    pub mod genotyper;
    pub mod operator;
    pub mod query;
    pub mod reference;
    pub mod remap;
    pub mod variant;
}

pub mod io {
    pub mod genotype_writer;
    pub mod site_reader;
}

pub mod utils {
    pub mod util;
}

pub mod constants;
pub mod error;

pub use constants::*;
