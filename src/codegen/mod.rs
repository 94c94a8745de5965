pub mod graph_printer;

pub use graph_printer::emit_graph_text;
