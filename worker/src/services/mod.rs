pub mod expiry_sweep_loop;
