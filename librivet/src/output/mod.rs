pub mod output_tabular;
