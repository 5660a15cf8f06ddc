pub mod viewpoint_coverage;
