//! # Decontaminated spectra and contaminant models
//!
//! Entities held by the [`SpectralStore`](crate::store::SpectralStore):
//!
//! * [`DecontaminatedSpectrum`] – the cutout of one object on one detector, with its
//!   science, variance and mask layers, the list of its contaminants, and the total
//!   contamination layer rebuilt from their models.
//! * [`ModelSpectrum`] – the modeled first- or second-order trace of an object, used
//!   as a contaminant of its neighbours.
//! * [`SpectralOrder`] – the spectral order of a trace; zeroth-order traces are never
//!   modeled.
//!
//! Every array is indexed `[row, column]`, i.e. `[y, x]`, and placed in the full
//! detector frame by the `(x_offset, y_offset)` position of its lower-left pixel.
//!
//! Contamination lifecycle
//! -----------------
//! The contamination layer is allocated zero-filled when the spectrum is built and
//! filled once by the compositor. [`MaterializationState`] records where a spectrum
//! stands in that lifecycle:
//!
//! ```text
//! Unmaterialized ──▶ Materializing ──▶ Materialized
//! ```
//!
//! Only the compositor writes the contamination layer.
pub mod wavelength;

use std::fmt;

use ndarray::{Array2, ArrayView2, ArrayViewMut2};

use crate::compositor::geometry::PixelBox;
use crate::constants::{Image, MaskFlags, ObjectId, Pixel};
use crate::decontam_errors::DecontamError;

use self::wavelength::PolynomialSolution;

/// Spectral order of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpectralOrder {
    /// Undispersed image of the source, never modeled.
    Zeroth,
    First,
    Second,
}

impl SpectralOrder {
    pub fn as_u8(self) -> u8 {
        match self {
            SpectralOrder::Zeroth => 0,
            SpectralOrder::First => 1,
            SpectralOrder::Second => 2,
        }
    }
}

impl TryFrom<i64> for SpectralOrder {
    type Error = DecontamError;

    fn try_from(order: i64) -> Result<Self, Self::Error> {
        match order {
            0 => Ok(SpectralOrder::Zeroth),
            1 => Ok(SpectralOrder::First),
            2 => Ok(SpectralOrder::Second),
            other => Err(DecontamError::UnsupportedOrder(other)),
        }
    }
}

impl fmt::Display for SpectralOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One entry of the contaminant table of a spectrum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Contaminant {
    pub id: ObjectId,
    pub order: SpectralOrder,
}

impl Contaminant {
    pub fn new(id: impl Into<ObjectId>, order: SpectralOrder) -> Self {
        Contaminant {
            id: id.into(),
            order,
        }
    }
}

/// Progress of the contamination layer of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterializationState {
    /// The layer is zero-filled and no contaminant has been added.
    #[default]
    Unmaterialized,
    /// Contaminants are being added.
    Materializing,
    /// Every contaminant has been added exactly once.
    Materialized,
}

/// Decontamination products of a single object on a single detector.
#[derive(Debug, Clone)]
pub struct DecontaminatedSpectrum {
    id: ObjectId,
    science: Image,
    variance: Image,
    mask: Array2<MaskFlags>,
    pub(crate) contamination: Image,
    contaminants: Vec<Contaminant>,
    x_offset: i64,
    y_offset: i64,
    solution: PolynomialSolution,
    pub(crate) state: MaterializationState,
}

impl DecontaminatedSpectrum {
    /// Build a spectrum from its layers.
    ///
    /// Arguments
    /// -----------------
    /// * `id` – object identifier.
    /// * `(x_offset, y_offset)` – detector position of the lower-left pixel of the cutout.
    /// * `science`, `variance`, `mask` – co-shaped layers of the cutout.
    /// * `contaminants` – ordered contaminant table.
    /// * `solution` – wavelength solution of the spectrum.
    ///
    /// Return
    /// ----------
    /// * The spectrum, with a zero-filled contamination layer of the same shape, or
    ///   [`DecontamError::ShapeMismatch`] if the layers disagree.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<ObjectId>,
        (x_offset, y_offset): (i64, i64),
        science: Image,
        variance: Image,
        mask: Array2<MaskFlags>,
        contaminants: Vec<Contaminant>,
        solution: PolynomialSolution,
    ) -> Result<Self, DecontamError> {
        let id = id.into();
        if variance.dim() != science.dim() || mask.dim() != science.dim() {
            return Err(DecontamError::ShapeMismatch {
                object_id: id,
                detail: format!(
                    "science {:?}, variance {:?}, mask {:?}",
                    science.dim(),
                    variance.dim(),
                    mask.dim()
                ),
            });
        }
        let contamination = Image::zeros(science.raw_dim());
        Ok(DecontaminatedSpectrum {
            id,
            science,
            variance,
            mask,
            contamination,
            contaminants,
            x_offset,
            y_offset,
            solution,
            state: MaterializationState::Unmaterialized,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn science(&self) -> ArrayView2<'_, Pixel> {
        self.science.view()
    }

    pub fn variance(&self) -> ArrayView2<'_, Pixel> {
        self.variance.view()
    }

    pub fn mask(&self) -> ArrayView2<'_, MaskFlags> {
        self.mask.view()
    }

    /// Total contamination of the spectrum.
    ///
    /// Zero-filled until the spectrum has been served by the store.
    pub fn contamination(&self) -> ArrayView2<'_, Pixel> {
        self.contamination.view()
    }

    pub fn contaminants(&self) -> &[Contaminant] {
        &self.contaminants
    }

    pub fn x_offset(&self) -> i64 {
        self.x_offset
    }

    pub fn y_offset(&self) -> i64 {
        self.y_offset
    }

    pub fn solution(&self) -> &PolynomialSolution {
        &self.solution
    }

    pub fn state(&self) -> MaterializationState {
        self.state
    }

    /// `(rows, columns)` of every layer.
    pub fn shape(&self) -> (usize, usize) {
        self.science.dim()
    }

    /// Footprint of the cutout in the detector frame.
    pub fn pixel_box(&self) -> PixelBox {
        PixelBox::of_array(self.x_offset, self.y_offset, self.science.dim())
    }

    /// Identifier, contaminant table and contamination canvas, borrowed together
    /// so the compositor can fill the canvas while walking the table.
    pub(crate) fn canvas_parts(&mut self) -> (&str, &[Contaminant], ArrayViewMut2<'_, Pixel>) {
        (&self.id, &self.contaminants, self.contamination.view_mut())
    }

    /// Science plus contamination, i.e. the spectrum before decontamination.
    pub fn original(&self) -> Image {
        &self.science + &self.contamination
    }
}

/// Modeled trace of an object in one spectral order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpectrum {
    id: ObjectId,
    order: SpectralOrder,
    pixels: Image,
    x_offset: i64,
    y_offset: i64,
}

impl ModelSpectrum {
    /// Build a model; zeroth-order models are rejected with [`DecontamError::InvalidOrder`].
    pub fn new(
        id: impl Into<ObjectId>,
        order: SpectralOrder,
        pixels: Image,
        (x_offset, y_offset): (i64, i64),
    ) -> Result<Self, DecontamError> {
        if order == SpectralOrder::Zeroth {
            return Err(DecontamError::InvalidOrder);
        }
        Ok(ModelSpectrum {
            id: id.into(),
            order,
            pixels,
            x_offset,
            y_offset,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order(&self) -> SpectralOrder {
        self.order
    }

    pub fn pixels(&self) -> ArrayView2<'_, Pixel> {
        self.pixels.view()
    }

    pub fn x_offset(&self) -> i64 {
        self.x_offset
    }

    pub fn y_offset(&self) -> i64 {
        self.y_offset
    }

    pub fn pixel_box(&self) -> PixelBox {
        PixelBox::of_array(self.x_offset, self.y_offset, self.pixels.dim())
    }
}
