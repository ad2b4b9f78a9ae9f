// Parser tests
mod parsing;



// Calculus tests
mod derivatives;
mod integrals;
mod limits_and_series;


// Matrix tests
mod matrices;

// Number theory tests
mod integers;

// Numeric evaluation tests
mod approximation;

// Operation dispatch tests
mod argument_binding;
