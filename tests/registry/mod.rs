mod selection;
mod support;
