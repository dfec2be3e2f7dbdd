mod half_open;
mod registry;
