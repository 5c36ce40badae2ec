pub mod metadata;

pub use metadata::{
    get_protein_length, put_protein_lengths, read_parameters, set_corrupted, set_fasta_path,
    set_import_complete, set_initial_tag_size, set_version, IndexParameters,
};
