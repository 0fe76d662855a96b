pub mod cli;
pub mod commands;
pub mod error;

pub mod core {
    pub mod arm_topology;
    pub mod breakend;
    pub mod breakend_index;
    pub mod chain;
    pub mod classify;
    pub mod cluster;
    pub mod clustering;
    pub mod double_minute;
    pub mod foldback;
    pub mod jcn;
    pub mod line_element;
    pub mod links;
    pub mod loh;
    pub mod metrics;
    pub mod reference;
    pub mod sample;
    pub mod svtype;
    pub mod variant;
    pub mod containers {
        pub mod forest;
        pub mod interval_tree;
    }
}

pub mod io {
    pub mod cohort_writer;
    pub mod readers;
    pub mod region_reader;
    pub mod run_stats;
    pub mod variant_reader;
}

pub mod utils {
    pub mod util;
}

pub mod constants;

pub use constants::*;
